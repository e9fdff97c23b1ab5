// ==========================================
// 商业地产资管系统 - 导入层
// ==========================================
// 职责: 外部表格数据 → 校验 → 类型化领域记录
// 支持: 工作簿 / 分隔文本 / JSON 数组
// 流程: 解析 → 列映射 → 校验 → 转换 → (期间锁) → 提交
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod session;
pub mod transformer;
pub mod validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMapping, MappingResolver};
pub use file_parser::{
    DelimitedParser, FileFormat, JsonParser, UniversalFileParser, WorkbookParser,
};
pub use session::{ImportSession, StartImportRequest};
pub use transformer::RecordTransformer;
pub use validator::{RowValidator, ValidationContext, ValidatorThresholds};
