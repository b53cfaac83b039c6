use std::fs;
use std::path::{Path, PathBuf};

use draftpad_core::geometry::Point2;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod export;

pub use export::{
    DEFAULT_LAYER, DIMENSION_LAYER, DxfDocument, DxfEntity, EntitySink, ExportOptions,
    INSUNITS_MILLIMETERS, export_document, write_entities,
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("不支持的 DXF 内容: {0}")]
    UnsupportedFeature(String),
    #[error("读取 DXF 文件 {path:?} 失败: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("写出 DXF 文件 {path:?} 失败: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("DXF 结构无效: {0}")]
    InvalidDocument(String),
}

/// 读写 `.dxf` 文件的入口。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }

    /// 读取 POINT/LINE/CIRCLE 实体。单位不是毫米时只记录警告，坐标按原值保留。
    pub fn load(&self, path: &Path) -> Result<DxfDocument, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let document = self.parse_str(&data)?;
        if !document.is_millimeters() {
            warn!(
                path = %path.display(),
                units = document.units(),
                "DXF 单位不是毫米，坐标按绘图单位原样读入，再次导出时将标记为毫米"
            );
        }
        debug!(path = %path.display(), entities = document.len(), "DXF 已读取");
        Ok(document)
    }

    pub fn save(&self, document: &DxfDocument, path: &Path) -> Result<(), IoError> {
        fs::write(path, document.stringify()).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), entities = document.len(), "DXF 已写出");
        Ok(())
    }

    /// 解析内存中的 DXF 文本。
    pub fn parse_str(&self, source: &str) -> Result<DxfDocument, IoError> {
        DxfParser::new(source).parse().map_err(|err| match err {
            DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
            DxfError::Invalid { message } => IoError::InvalidDocument(message),
        })
    }
}

#[derive(Debug)]
enum DxfError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl DxfError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<DxfDocument, DxfError> {
        let mut document = DxfDocument::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "HEADER" => self.parse_header(&mut document)?,
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    /// 只读取 `$INSUNITS`，其余头变量忽略。
    fn parse_header(&mut self, document: &mut DxfDocument) -> Result<(), DxfError> {
        let mut current: Option<String> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some((9, name)) => current = Some(name.trim().to_string()),
                Some((70, value)) if current.as_deref() == Some("$INSUNITS") => {
                    document.set_units(parse_i16(&value, "$INSUNITS")?);
                }
                Some(_) => {}
                None => return Err(DxfError::invalid("HEADER 段提前结束")),
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut DxfDocument) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }
            match value.trim() {
                "ENDSEC" => break,
                "POINT" => document.push(self.parse_point()?),
                "LINE" => document.push(self.parse_line()?),
                "CIRCLE" => document.push(self.parse_circle()?),
                other => {
                    return Err(DxfError::unsupported(format!("实体类型 {other}")));
                }
            }
        }
        Ok(())
    }

    /// 读取实体的全部组码直到下一个 0 组码，交给 `accept` 逐个处理，返回图层名。
    fn read_entity_body(
        &mut self,
        kind: &str,
        mut accept: impl FnMut(i32, &str) -> Result<(), DxfError>,
    ) -> Result<String, DxfError> {
        let mut layer = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((8, value)) => layer = Some(value.trim().to_string()),
                Some((code, value)) => accept(code, &value)?,
                None => return Err(DxfError::invalid(format!("{kind} 未正确结束"))),
            }
        }
        Ok(layer.unwrap_or_else(|| DEFAULT_LAYER.to_string()))
    }

    fn parse_point(&mut self) -> Result<DxfEntity, DxfError> {
        let mut x = None;
        let mut y = None;
        let layer = self.read_entity_body("POINT", |code, value| match code {
            10 => assign_coord(&mut x, value, "POINT X（组码 10）"),
            20 => assign_coord(&mut y, value, "POINT Y（组码 20）"),
            _ => Ok(()),
        })?;
        Ok(DxfEntity::Point {
            layer,
            position: require_point(x, y, "POINT 坐标（组码 10/20）")?,
        })
    }

    fn parse_line(&mut self) -> Result<DxfEntity, DxfError> {
        let (mut sx, mut sy, mut ex, mut ey) = (None, None, None, None);
        let layer = self.read_entity_body("LINE", |code, value| match code {
            10 => assign_coord(&mut sx, value, "LINE 起点 X（组码 10）"),
            20 => assign_coord(&mut sy, value, "LINE 起点 Y（组码 20）"),
            11 => assign_coord(&mut ex, value, "LINE 终点 X（组码 11）"),
            21 => assign_coord(&mut ey, value, "LINE 终点 Y（组码 21）"),
            // 忽略 Z 坐标
            _ => Ok(()),
        })?;
        Ok(DxfEntity::Line {
            layer,
            start: require_point(sx, sy, "LINE 起点（组码 10/20）")?,
            end: require_point(ex, ey, "LINE 终点（组码 11/21）")?,
        })
    }

    fn parse_circle(&mut self) -> Result<DxfEntity, DxfError> {
        let (mut cx, mut cy, mut radius) = (None, None, None);
        let layer = self.read_entity_body("CIRCLE", |code, value| match code {
            10 => assign_coord(&mut cx, value, "CIRCLE 圆心 X（组码 10）"),
            20 => assign_coord(&mut cy, value, "CIRCLE 圆心 Y（组码 20）"),
            40 => assign_coord(&mut radius, value, "CIRCLE 半径（组码 40）"),
            _ => Ok(()),
        })?;
        Ok(DxfEntity::Circle {
            layer,
            center: require_point(cx, cy, "CIRCLE 圆心（组码 10/20）")?,
            radius: radius.ok_or_else(|| DxfError::invalid("CIRCLE 缺少半径（组码 40）"))?,
        })
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        // 跳过组码前的空行
        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 只能回退一次");
        self.buffer = Some(pair);
    }
}

fn assign_coord(slot: &mut Option<f64>, raw: &str, context: &str) -> Result<(), DxfError> {
    if slot.is_some() {
        return Err(DxfError::invalid(format!("{context} 出现重复值")));
    }
    *slot = Some(parse_f64(raw, context)?);
    Ok(())
}

fn require_point(x: Option<f64>, y: Option<f64>, context: &str) -> Result<Point2, DxfError> {
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point2::new(x, y)),
        _ => Err(DxfError::invalid(format!("缺少{context}"))),
    }
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 的值 \"{}\" 不是有效数字", raw.trim())))
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    raw.trim()
        .parse::<i16>()
        .map_err(|_| DxfError::invalid(format!("{context} 的值 \"{}\" 不是有效整数", raw.trim())))
}
