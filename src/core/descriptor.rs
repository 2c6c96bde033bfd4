//! Line-oriented parser for descriptor (`.ctl`) files.
//!
//! Keywords are matched case-insensitively on the first token. The parser is
//! a two-state machine: header records are interpreted one by one until a
//! `vars` record switches it into the variable block, which collects
//! declarations until `endvars` or the declared count is reached.

use crate::core::grid::{Grid, LinearAxis};
use crate::core::source::ByteOrder;
use crate::core::time::{self, TimeAxis};
use crate::utils::error::{ConvertError, Result};
use std::path::{Path, PathBuf};

const COORDINATE_NAMES: [&str; 4] = ["time", "level", "lat", "lon"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    #[default]
    Standard,
    NoLeap,
}

impl Calendar {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::NoLeap => "365_day",
        }
    }
}

/// One entry of the `vars` block, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub levels: u32,
    pub description: String,
    pub line: usize,
}

/// Everything a descriptor declares. Grid-dependent fields stay `None`
/// until their defining record is seen; the `require_*` accessors turn
/// a missing record into a configuration error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub dset: Option<PathBuf>,
    pub undef: Option<f64>,
    pub title: Option<String>,
    pub calendar: Calendar,
    pub byte_order: ByteOrder,
    pub xdef: Option<LinearAxis>,
    pub ydef: Option<LinearAxis>,
    pub zdef: Option<LinearAxis>,
    pub tdef: Option<TimeAxis>,
    pub variables: Vec<VariableDecl>,
}

impl Descriptor {
    pub fn require_grid(&self) -> Result<Grid> {
        let missing = |keyword: &str| {
            ConvertError::config(format!("'{}' must be defined before reading data", keyword))
        };
        Ok(Grid {
            lon: self.xdef.ok_or_else(|| missing("xdef"))?,
            lat: self.ydef.ok_or_else(|| missing("ydef"))?,
            level: self.zdef.ok_or_else(|| missing("zdef"))?,
        })
    }

    pub fn require_time(&self) -> Result<&TimeAxis> {
        self.tdef
            .as_ref()
            .ok_or_else(|| ConvertError::config("'tdef' must be defined before reading data"))
    }

    pub fn require_undef(&self) -> Result<f64> {
        self.undef
            .ok_or_else(|| ConvertError::config("'undef' is not defined"))
    }

    pub fn require_dset(&self) -> Result<&Path> {
        self.dset
            .as_deref()
            .ok_or_else(|| ConvertError::config("'dset' is not defined"))
    }

    /// Variable names in on-disk order.
    pub fn varlist(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Header,
    InVariableBlock { remaining: usize },
}

pub struct DescriptorParser {
    state: ParserState,
    base_dir: PathBuf,
    descriptor: Descriptor,
}

impl DescriptorParser {
    /// `base_dir` anchors `dset ^file` paths.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: ParserState::Header,
            base_dir: base_dir.into(),
            descriptor: Descriptor::default(),
        }
    }

    pub fn feed_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = words.first() else {
            return Ok(());
        };
        let keyword = first.to_lowercase();

        self.state = match self.state {
            ParserState::Header => self.header_record(line_no, &keyword, &words)?,
            ParserState::InVariableBlock { remaining } => {
                self.variable_record(line_no, &keyword, &words, remaining)?
            }
        };
        Ok(())
    }

    pub fn finish(self) -> Result<Descriptor> {
        if let ParserState::InVariableBlock { remaining } = self.state {
            tracing::warn!(
                "Descriptor ended inside the vars block, {} declaration(s) missing",
                remaining
            );
        }
        Ok(self.descriptor)
    }

    fn header_record(&mut self, line_no: usize, keyword: &str, words: &[&str]) -> Result<ParserState> {
        let d = &mut self.descriptor;
        match keyword {
            "title" => {
                d.title = Some(words[1..].join(" "));
            }
            "dset" => {
                let target = token(words, 1, line_no, "dset path")?;
                d.dset = Some(match target.strip_prefix('^') {
                    Some(relative) => self.base_dir.join(relative),
                    None => PathBuf::from(target),
                });
            }
            "undef" => {
                d.undef = Some(number(words, 1, line_no)?);
            }
            "options" => {
                for option in &words[1..] {
                    match option.to_lowercase().as_str() {
                        "365_day_calendar" => d.calendar = Calendar::NoLeap,
                        "big_endian" => d.byte_order = ByteOrder::Big,
                        "little_endian" => d.byte_order = ByteOrder::Little,
                        "template" => {
                            return Err(ConvertError::unsupported("templated multi-file datasets"))
                        }
                        other => tracing::debug!("Ignoring option '{}' on line {}", other, line_no),
                    }
                }
            }
            "xdef" => d.xdef = Some(linear_axis(words, line_no)?),
            "ydef" => d.ydef = Some(linear_axis(words, line_no)?),
            "zdef" => {
                let mut axis = linear_axis(words, line_no)?;
                if axis.count == 0 {
                    axis.count = 1;
                }
                d.zdef = Some(axis);
            }
            "tdef" => d.tdef = Some(time_axis(words, line_no)?),
            "vars" => {
                let count: usize = number(words, 1, line_no)?;
                return Ok(if count == 0 {
                    ParserState::Header
                } else {
                    ParserState::InVariableBlock { remaining: count }
                });
            }
            _ => tracing::debug!("Ignoring '{}' record on line {}", keyword, line_no),
        }
        Ok(ParserState::Header)
    }

    fn variable_record(
        &mut self,
        line_no: usize,
        keyword: &str,
        words: &[&str],
        remaining: usize,
    ) -> Result<ParserState> {
        if keyword == "endvars" {
            if remaining > 0 {
                tracing::warn!(
                    "'endvars' on line {} closes the block with {} declaration(s) fewer than announced",
                    line_no,
                    remaining
                );
            }
            return Ok(ParserState::Header);
        }
        if keyword.starts_with('*') {
            return Ok(ParserState::InVariableBlock { remaining });
        }

        let name = keyword.to_string();
        let levels: u32 = number(words, 1, line_no)?;
        token(words, 2, line_no, "units field")?;
        let description = words[3..].join(" ");

        if COORDINATE_NAMES.contains(&name.as_str()) {
            return Err(ConvertError::parse(
                line_no,
                format!("variable '{}' collides with a coordinate variable", name),
            ));
        }
        if self.descriptor.variables.iter().any(|v| v.name == name) {
            return Err(ConvertError::parse(
                line_no,
                format!("variable '{}' declared twice", name),
            ));
        }
        if levels > 1 {
            tracing::warn!(
                "Variable '{}' declares {} levels; it is read as a single-level field",
                name,
                levels
            );
        }

        self.descriptor.variables.push(VariableDecl {
            name,
            levels,
            description,
            line: line_no,
        });

        Ok(match remaining {
            0 | 1 => ParserState::Header,
            n => ParserState::InVariableBlock { remaining: n - 1 },
        })
    }
}

/// Parse descriptor text. `base_dir` is the directory `^` paths resolve against.
pub fn parse_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Descriptor> {
    let mut parser = DescriptorParser::new(base_dir);
    for (i, line) in text.lines().enumerate() {
        parser.feed_line(i + 1, line)?;
    }
    parser.finish()
}

pub fn parse_file(path: &Path) -> Result<Descriptor> {
    let text = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    tracing::debug!("Parsing descriptor {}", path.display());
    parse_str(&text, base_dir)
}

fn token<'a>(words: &[&'a str], index: usize, line_no: usize, what: &str) -> Result<&'a str> {
    words
        .get(index)
        .copied()
        .ok_or_else(|| ConvertError::parse(line_no, format!("missing {}", what)))
}

fn number<T: std::str::FromStr>(words: &[&str], index: usize, line_no: usize) -> Result<T> {
    let raw = token(words, index, line_no, "numeric field")?;
    raw.parse()
        .map_err(|_| ConvertError::parse(line_no, format!("'{}' is not a valid number", raw)))
}

fn linear_axis(words: &[&str], line_no: usize) -> Result<LinearAxis> {
    let count: usize = number(words, 1, line_no)?;
    let mapping = token(words, 2, line_no, "axis mapping")?;
    if !mapping.eq_ignore_ascii_case("linear") {
        return Err(ConvertError::unsupported(format!(
            "'{}' axis mapping in {} (only linear grids are supported)",
            mapping, words[0]
        )));
    }
    Ok(LinearAxis::new(
        count,
        number(words, 3, line_no)?,
        number(words, 4, line_no)?,
    ))
}

fn time_axis(words: &[&str], line_no: usize) -> Result<TimeAxis> {
    let count: usize = number(words, 1, line_no)?;
    let mapping = token(words, 2, line_no, "tdef mapping")?;
    if !mapping.eq_ignore_ascii_case("linear") {
        return Err(ConvertError::unsupported(format!("'{}' tdef mapping", mapping)));
    }
    Ok(TimeAxis {
        count,
        start: time::parse_start(token(words, 3, line_no, "tdef start")?, line_no)?,
        step: time::parse_step(token(words, 4, line_no, "tdef step")?, line_no)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeUnit;

    const SAMPLE: &str = "\
DSET ^run1.bin
TITLE  Regional   downscaled output
UNDEF -999.0
OPTIONS 365_day_calendar
XDEF 4 LINEAR 10.0 0.5
YDEF 3 LINEAR -35.0 0.5
ZDEF 0 LINEAR 0 1
TDEF 3 LINEAR 00Z01Jan2000 1dy
VARS 2
PR 0 99 daily precipitation
Tmax 1 99 maximum temperature
ENDVARS
";

    #[test]
    fn test_parse_header_records() {
        let d = parse_str(SAMPLE, "/data/ctl").unwrap();
        assert_eq!(d.dset.as_deref(), Some(Path::new("/data/ctl/run1.bin")));
        assert_eq!(d.undef, Some(-999.0));
        assert_eq!(d.title.as_deref(), Some("Regional downscaled output"));
        assert_eq!(d.calendar, Calendar::NoLeap);
        assert_eq!(d.xdef, Some(LinearAxis::new(4, 10.0, 0.5)));
        assert_eq!(d.ydef, Some(LinearAxis::new(3, -35.0, 0.5)));
        let time = d.require_time().unwrap();
        assert_eq!(time.count, 3);
        assert_eq!(time.step.unit, TimeUnit::Days);
    }

    #[test]
    fn test_zdef_zero_is_single_level() {
        let d = parse_str(SAMPLE, ".").unwrap();
        let level = d.zdef.unwrap();
        assert_eq!(level.count, 1);
        assert_eq!(level.values().to_vec(), vec![0.0]);
    }

    #[test]
    fn test_variables_keep_declaration_order_and_lowercase() {
        let d = parse_str(SAMPLE, ".").unwrap();
        assert_eq!(d.varlist(), vec!["pr".to_string(), "tmax".to_string()]);
        assert_eq!(d.variables[0].description, "daily precipitation");
        assert_eq!(d.variables[1].line, 11);
    }

    #[test]
    fn test_default_calendar_and_absolute_dset() {
        let d = parse_str("dset /abs/data.bin\n", "/ignored").unwrap();
        assert_eq!(d.calendar, Calendar::Standard);
        assert_eq!(d.dset.as_deref(), Some(Path::new("/abs/data.bin")));
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let err = parse_str("undef -999\nxdef four linear 0 1\n", ".").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_non_linear_axis_is_unsupported() {
        let err = parse_str("ydef 3 levels 10 20 30\n", ".").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_unsupported_time_unit() {
        let err = parse_str("tdef 4 linear 00Z01Jan2000 6hr\n", ".").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_template_option_is_unsupported() {
        let err = parse_str("options template\n", ".").unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_byte_order_options() {
        assert_eq!(parse_str("options big_endian\n", ".").unwrap().byte_order, ByteOrder::Big);
        assert_eq!(
            parse_str("OPTIONS little_endian 365_day_calendar\n", ".").unwrap().byte_order,
            ByteOrder::Little
        );
    }

    #[test]
    fn test_block_closes_after_declared_count() {
        let text = "vars 1\na 0 99 first\ntitle after block\n";
        let d = parse_str(text, ".").unwrap();
        assert_eq!(d.varlist(), vec!["a".to_string()]);
        assert_eq!(d.title.as_deref(), Some("after block"));
    }

    #[test]
    fn test_early_endvars_and_blank_lines() {
        let text = "vars 3\n\na 0 99 first\n\nendvars\n";
        let d = parse_str(text, ".").unwrap();
        assert_eq!(d.varlist(), vec!["a".to_string()]);
    }

    #[test]
    fn test_duplicate_and_coordinate_names_rejected() {
        assert!(parse_str("vars 2\na 0 99 x\nA 0 99 y\nendvars\n", ".").is_err());
        assert!(parse_str("vars 1\nlat 0 99 x\nendvars\n", ".").is_err());
    }

    #[test]
    fn test_missing_definitions_are_config_errors() {
        let d = parse_str("undef 1\n", ".").unwrap();
        assert!(matches!(d.require_grid(), Err(ConvertError::Config { .. })));
        assert!(matches!(d.require_time(), Err(ConvertError::Config { .. })));
        assert!(matches!(d.require_dset(), Err(ConvertError::Config { .. })));
        assert_eq!(d.require_undef().unwrap(), 1.0);
    }

    #[test]
    fn test_unrecognized_lines_ignored() {
        let d = parse_str("* comment\nfileheader 0\npdef 1 2 3\n", ".").unwrap();
        assert_eq!(d, Descriptor::default());
    }
}
