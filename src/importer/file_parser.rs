// ==========================================
// 商业地产资管系统 - 文件解析器实现
// ==========================================
// 职责: 原始字节 → RawTable(统一内存表格)
// 支持: 工作簿 (.xlsx) / 分隔文本 / JSON 对象数组
// ==========================================

use crate::domain::table::RawTable;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{Reader, Xlsx};
use csv::ReaderBuilder;
use serde_json::Value as JsonValue;
use std::io::Cursor;

/// ZIP 容器签名(xlsx 本质是 zip)
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

// ==========================================
// FileFormat - 输入格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Workbook,  // Excel 工作簿
    Delimited, // CSV / 分号 / 制表符分隔文本
    Json,      // JSON 对象数组
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Workbook => "workbook",
            FileFormat::Delimited => "delimited",
            FileFormat::Json => "json",
        }
    }

    /// 按字节签名嗅探格式
    pub fn sniff(bytes: &[u8]) -> ImportResult<Self> {
        if bytes.starts_with(ZIP_SIGNATURE) {
            return Ok(FileFormat::Workbook);
        }

        // 跳过 BOM 与前导空白后看首字符
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ImportError::UnsupportedFormat("未知二进制签名".to_string()))?;
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('[') {
            return Ok(FileFormat::Json);
        }

        // 其余合法文本按分隔文本处理
        Ok(FileFormat::Delimited)
    }
}

// ==========================================
// 工作簿解析
// ==========================================
pub struct WorkbookParser;

impl WorkbookParser {
    pub fn parse(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| ImportError::WorkbookParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::WorkbookParseError("工作簿无工作表".to_string()));
        }

        // 只读第一个 sheet
        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::WorkbookParseError(e.to_string()))?;

        let mut rows_iter = range.rows();
        let header_row = rows_iter.next().ok_or(ImportError::EmptyFile)?;

        let columns: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for data_row in rows_iter {
            let mut cells: Vec<String> = data_row
                .iter()
                .take(columns.len()) // 多余单元格丢弃
                .map(|cell| cell.to_string().trim().to_string())
                .collect();
            cells.resize(columns.len(), String::new()); // 尾部缺失补空

            // 跳过完全空白的行
            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(cells);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        Ok(RawTable::new(columns, rows))
    }
}

// ==========================================
// 分隔文本解析
// ==========================================
pub struct DelimitedParser;

impl DelimitedParser {
    /// 在表头行上嗅探分隔符(逗号/分号/制表符,取出现最多者)
    fn sniff_delimiter(text: &str) -> u8 {
        let header_line = text.lines().next().unwrap_or("");
        let candidates = [b',', b';', b'\t'];
        let mut best = b',';
        let mut best_count = 0;
        for &delim in &candidates {
            let count = header_line.bytes().filter(|b| *b == delim).count();
            if count > best_count {
                best = delim;
                best_count = count;
            }
        }
        best
    }

    pub fn parse(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| ImportError::DelimitedParseError("非 UTF-8 文本".to_string()))?;
        let text = text.trim_start_matches('\u{feff}');
        let delimiter = Self::sniff_delimiter(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut cells: Vec<String> = record
                .iter()
                .take(columns.len())
                .map(|v| v.trim().to_string())
                .collect();
            cells.resize(columns.len(), String::new());

            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(cells);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        Ok(RawTable::new(columns, rows))
    }
}

// ==========================================
// JSON 对象数组解析
// ==========================================
pub struct JsonParser;

impl JsonParser {
    fn scalar_to_string(value: &JsonValue) -> String {
        match value {
            JsonValue::Null => String::new(),
            JsonValue::String(s) => s.trim().to_string(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }

    pub fn parse(&self, bytes: &[u8]) -> ImportResult<RawTable> {
        let objects: Vec<serde_json::Map<String, JsonValue>> = serde_json::from_slice(bytes)?;

        // 列顺序 = 键的首次出现顺序
        let mut columns: Vec<String> = Vec::new();
        for obj in &objects {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for obj in &objects {
            let cells: Vec<String> = columns
                .iter()
                .map(|col| obj.get(col).map(Self::scalar_to_string).unwrap_or_default())
                .collect();
            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }
            rows.push(cells);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        Ok(RawTable::new(columns, rows))
    }
}

// ==========================================
// 通用文件解析器(按声明格式或字节签名选择)
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse_bytes(
        &self,
        bytes: &[u8],
        declared: Option<FileFormat>,
    ) -> ImportResult<RawTable> {
        let format = match declared {
            Some(f) => f,
            None => FileFormat::sniff(bytes)?,
        };

        match format {
            FileFormat::Workbook => WorkbookParser.parse(bytes),
            FileFormat::Delimited => DelimitedParser.parse(bytes),
            FileFormat::Json => JsonParser.parse(bytes),
        }
    }
}
