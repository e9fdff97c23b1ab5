// ==========================================
// 商业地产资管系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入/校验所需的配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::validator::ValidatorThresholds;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager(从 config_kv 表读取)
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取提交行块大小
    ///
    /// # 默认值
    /// - 50
    ///
    /// # 用途
    /// - 提交引擎按此块数落库,块间检查取消并让出调度
    async fn get_commit_chunk_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取合理年租金区间(下限, 上限)
    ///
    /// # 默认值
    /// - (100.0, 10_000_000.0)
    ///
    /// # 用途
    /// - PlausibleRent 规则的告警边界
    async fn get_rent_plausible_range(&self) -> Result<(f64, f64), Box<dyn Error>>;

    /// 获取租约最大合理跨度(年)
    ///
    /// # 默认值
    /// - 30
    async fn get_max_lease_span_years(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取合理日期年份窗口(下限, 上限)
    ///
    /// # 默认值
    /// - (1990, 2100)
    async fn get_plausible_year_window(&self) -> Result<(i32, i32), Box<dyn Error>>;

    /// 汇总为校验阈值(构造校验器时一次性读取)
    async fn validator_thresholds(&self) -> Result<ValidatorThresholds, Box<dyn Error>> {
        let (rent_min, rent_max) = self.get_rent_plausible_range().await?;
        let (year_min, year_max) = self.get_plausible_year_window().await?;
        Ok(ValidatorThresholds {
            rent_min,
            rent_max,
            max_lease_span_years: self.get_max_lease_span_years().await?,
            year_min,
            year_max,
        })
    }
}
