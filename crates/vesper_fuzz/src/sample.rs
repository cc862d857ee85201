//! The crasher sample bundle and its line-oriented text codec.

use crate::error::SampleError;
use crate::options::{SampleOptions, SampleType};
use vesper_ir::Value;

/// Markers for the start/end of the config record in the crasher text.
const START_CONFIG: &str = "BEGIN_CONFIG";
const END_CONFIG: &str = "END_CONFIG";

/// Placeholder recorded in the `issue` field of emitted crashers. Split so
/// the marker itself never appears verbatim in this source file.
fn issue_placeholder() -> String {
    format!("DO NOT {}Insert link to GitHub issue here.", "SUBMIT ")
}

/// A reproducer bundle: input text, pipeline options, argument batches, and
/// (for proc samples) the channel each input column feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    input_text: String,
    options: SampleOptions,
    args_batch: Vec<Vec<Value>>,
    ir_channel_names: Vec<String>,
}

impl Sample {
    /// Creates a sample.
    ///
    /// For proc samples `ir_channel_names` lists the channel fed by each
    /// argument column, in column order; function samples leave it empty.
    pub fn new(
        input_text: impl Into<String>,
        options: SampleOptions,
        args_batch: Vec<Vec<Value>>,
        ir_channel_names: Vec<String>,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            options,
            args_batch,
            ir_channel_names,
        }
    }

    /// Returns the input source text.
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Returns the options record.
    pub fn options(&self) -> &SampleOptions {
        &self.options
    }

    /// Returns the argument batches, one vector per call/tick.
    pub fn args_batch(&self) -> &[Vec<Value>] {
        &self.args_batch
    }

    /// Returns the channel names of a proc sample, in column order.
    pub fn ir_channel_names(&self) -> &[String] {
        &self.ir_channel_names
    }

    /// Serializes the sample: the config record fenced by comment markers,
    /// a blank line, then the raw input text.
    ///
    /// `error_message`, when given, is recorded as the config's `exception`
    /// field.
    pub fn serialize(&self, error_message: Option<&str>) -> String {
        let mut config = Vec::new();
        if let Some(message) = error_message {
            config.push(format!("exception: {}", quote(message)));
        }
        config.push(format!("issue: {}", quote(&issue_placeholder())));
        self.push_options_record(&mut config);
        self.push_inputs_record(&mut config);

        let mut lines = Vec::new();
        lines.push(format!("// {START_CONFIG}"));
        for entry in config {
            lines.push(format!("// {entry}"));
        }
        lines.push(format!("// {END_CONFIG}"));
        lines.push(String::new());
        lines.push(self.input_text.clone());
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn push_options_record(&self, config: &mut Vec<String>) {
        let o = &self.options;
        config.push(format!("input_is_hdl: {}", o.input_is_hdl));
        config.push(format!("sample_type: {}", o.sample_type));
        for arg in &o.ir_converter_args {
            config.push(format!("ir_converter_args: {}", quote(arg)));
        }
        config.push(format!("convert_to_ir: {}", o.convert_to_ir));
        config.push(format!("optimize_ir: {}", o.optimize_ir));
        config.push(format!("use_jit: {}", o.use_jit));
        config.push(format!("codegen: {}", o.codegen));
        for arg in &o.codegen_args {
            config.push(format!("codegen_args: {}", quote(arg)));
        }
        config.push(format!("simulate: {}", o.simulate));
        if let Some(simulator) = &o.simulator {
            config.push(format!("simulator: {}", quote(simulator)));
        }
        config.push(format!("use_system_verilog: {}", o.use_system_verilog));
        if let Some(timeout) = o.timeout_seconds {
            config.push(format!("timeout_seconds: {timeout}"));
        }
        config.push(format!("calls_per_sample: {}", o.calls_per_sample));
        if let Some(ticks) = o.proc_ticks {
            config.push(format!("proc_ticks: {ticks}"));
        }
    }

    fn push_inputs_record(&self, config: &mut Vec<String>) {
        if self.options.is_function_sample() {
            for row in &self.args_batch {
                config.push(format!("args: {}", quote(&value_row_to_text(row))));
            }
        } else {
            // Proc inputs are serialized by channel: one record per channel
            // carrying that channel's per-tick values in order.
            for (column, channel) in self.ir_channel_names.iter().enumerate() {
                let values: Vec<String> = self
                    .args_batch
                    .iter()
                    .map(|row| row[column].to_string())
                    .collect();
                config.push(format!(
                    "channel_input: {}",
                    quote(&format!("{channel}: {}", values.join("; ")))
                ));
            }
        }
    }

    /// Parses a sample from its serialized text.
    ///
    /// Comment lines outside the config fences (e.g. a license header) are
    /// ignored, as are blank lines.
    pub fn deserialize(text: &str) -> Result<Sample, SampleError> {
        let mut in_config = false;
        let mut config_lines: Vec<&str> = Vec::new();
        let mut source_lines: Vec<&str> = Vec::new();
        for line in text.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }
            if let Some(comment) = stripped.strip_prefix("//") {
                let contents = comment.trim();
                if contents == START_CONFIG {
                    in_config = true;
                } else if contents == END_CONFIG {
                    in_config = false;
                } else if in_config {
                    config_lines.push(contents);
                }
            } else {
                source_lines.push(line);
            }
        }
        if config_lines.is_empty() {
            return Err(SampleError::InvalidInput(
                "missing or empty config".to_string(),
            ));
        }

        let mut options = SampleOptions::default();
        let mut args_batch: Vec<Vec<Value>> = Vec::new();
        let mut ir_channel_names: Vec<String> = Vec::new();
        for line in config_lines {
            let (key, value) = line.split_once(':').ok_or_else(|| {
                SampleError::InvalidInput(format!("malformed config line '{line}'"))
            })?;
            let value = value.trim();
            match key.trim() {
                "exception" | "issue" => {}
                "input_is_hdl" => options.input_is_hdl = parse_bool(value)?,
                "sample_type" => {
                    options.sample_type = value
                        .parse::<SampleType>()
                        .map_err(SampleError::InvalidInput)?;
                }
                "ir_converter_args" => options.ir_converter_args.push(unquote(value)?),
                "convert_to_ir" => options.convert_to_ir = parse_bool(value)?,
                "optimize_ir" => options.optimize_ir = parse_bool(value)?,
                "use_jit" => options.use_jit = parse_bool(value)?,
                "codegen" => options.codegen = parse_bool(value)?,
                "codegen_args" => options.codegen_args.push(unquote(value)?),
                "simulate" => options.simulate = parse_bool(value)?,
                "simulator" => options.simulator = Some(unquote(value)?),
                "use_system_verilog" => options.use_system_verilog = parse_bool(value)?,
                "timeout_seconds" => options.timeout_seconds = Some(parse_u64(value)?),
                "calls_per_sample" => options.calls_per_sample = parse_u64(value)?,
                "proc_ticks" => options.proc_ticks = Some(parse_u64(value)?),
                "args" => args_batch.push(parse_value_row(&unquote(value)?)?),
                "channel_input" => {
                    let record = unquote(value)?;
                    let (channel, values_text) = record.split_once(':').ok_or_else(|| {
                        SampleError::InvalidInput(format!(
                            "malformed channel input '{record}'"
                        ))
                    })?;
                    ir_channel_names.push(channel.trim().to_string());
                    // Transpose the column-major channel record back into
                    // tick-major batches.
                    for (tick, value_text) in parse_value_row(values_text)?.into_iter().enumerate()
                    {
                        if args_batch.len() <= tick {
                            args_batch.resize(tick + 1, Vec::new());
                        }
                        args_batch[tick].push(value_text);
                    }
                }
                other => {
                    return Err(SampleError::InvalidInput(format!(
                        "unknown config field '{other}'"
                    )));
                }
            }
        }

        Ok(Sample::new(
            source_lines.join("\n"),
            options,
            args_batch,
            ir_channel_names,
        ))
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.serialize(None))
    }
}

fn value_row_to_text(row: &[Value]) -> String {
    let rendered: Vec<String> = row.iter().map(|v| v.to_string()).collect();
    rendered.join("; ")
}

fn parse_value_row(text: &str) -> Result<Vec<Value>, SampleError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(';')
        .map(|part| Value::parse_typed(part.trim()).map_err(SampleError::from))
        .collect()
}

fn parse_bool(text: &str) -> Result<bool, SampleError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(SampleError::InvalidInput(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_u64(text: &str) -> Result<u64, SampleError> {
    text.parse()
        .map_err(|_| SampleError::InvalidInput(format!("expected an integer, got '{text}'")))
}

/// Quotes a string value for the config record.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Reverses [`quote`].
fn unquote(s: &str) -> Result<String, SampleError> {
    let inner = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| SampleError::InvalidInput(format!("expected a quoted string: {s}")))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            other => {
                return Err(SampleError::InvalidInput(format!(
                    "bad escape '\\{}'",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "fn main(x: bits[8]) -> bits[8] {\n  neg(x)\n}";

    fn function_sample() -> Sample {
        let mut options = SampleOptions::default();
        options.calls_per_sample = 2;
        options.ir_converter_args = vec!["--top=main".to_string()];
        Sample::new(
            SOURCE,
            options,
            vec![
                vec![Value::bits(8, 0x2a), Value::bits(8, 3)],
                vec![Value::bits(8, 1), Value::bits(8, 0)],
            ],
            vec![],
        )
    }

    fn proc_sample() -> Sample {
        let mut options = SampleOptions::default();
        options.sample_type = SampleType::Proc;
        options.proc_ticks = Some(2);
        Sample::new(
            "proc main { }",
            options,
            vec![
                vec![Value::bits(8, 0x00), Value::bits(8, 0x01)],
                vec![Value::bits(8, 0x10), Value::bits(8, 0x11)],
            ],
            vec!["c0".to_string(), "c1".to_string()],
        )
    }

    #[test]
    fn function_roundtrip() {
        let sample = function_sample();
        let text = sample.serialize(None);
        let back = Sample::deserialize(&text).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn roundtrip_with_exception() {
        let sample = function_sample();
        let text = sample.serialize(Some("boom: assertion \"x < 2\" failed"));
        assert!(text.contains("exception: \"boom: assertion \\\"x < 2\\\" failed\""));
        let back = Sample::deserialize(&text).unwrap();
        // The recorded exception is not part of sample identity.
        assert_eq!(back, sample);
    }

    #[test]
    fn serialized_layout() {
        let sample = function_sample();
        let text = sample.serialize(None);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "// BEGIN_CONFIG");
        let end = lines.iter().position(|l| *l == "// END_CONFIG").unwrap();
        assert!(lines[1..end].iter().all(|l| l.starts_with("// ")));
        assert_eq!(lines[end + 1], "");
        assert_eq!(lines[end + 2], "fn main(x: bits[8]) -> bits[8] {");
        assert!(text.contains("args: \"bits[8]:0x2a; bits[8]:0x3\""));
    }

    #[test]
    fn proc_serialization_groups_by_channel() {
        let sample = proc_sample();
        let text = sample.serialize(None);
        assert!(text.contains("channel_input: \"c0: bits[8]:0x0; bits[8]:0x10\""));
        assert!(text.contains("channel_input: \"c1: bits[8]:0x1; bits[8]:0x11\""));
    }

    #[test]
    fn proc_roundtrip_transposes_back() {
        let sample = proc_sample();
        let back = Sample::deserialize(&sample.serialize(None)).unwrap();
        assert_eq!(back, sample);
        assert_eq!(back.args_batch().len(), 2);
        assert_eq!(back.args_batch()[0].len(), 2);
    }

    #[test]
    fn missing_config_is_invalid() {
        let err = Sample::deserialize("fn main() {}").unwrap_err();
        assert!(err.to_string().contains("missing or empty config"));
        let err = Sample::deserialize("// BEGIN_CONFIG\n// END_CONFIG\nfn main() {}").unwrap_err();
        assert!(err.to_string().contains("missing or empty config"));
    }

    #[test]
    fn unknown_field_is_invalid() {
        let text = "// BEGIN_CONFIG\n// frobnicate: true\n// END_CONFIG\nfn main() {}";
        let err = Sample::deserialize(text).unwrap_err();
        assert!(err.to_string().contains("unknown config field"));
    }

    #[test]
    fn malformed_value_is_invalid() {
        let text = "// BEGIN_CONFIG\n// args: \"bots[8]:0x1\"\n// END_CONFIG\nfn main() {}";
        assert!(Sample::deserialize(text).is_err());
    }

    #[test]
    fn comment_lines_outside_config_are_ignored() {
        let sample = function_sample();
        let text = format!("// Copyright notice\n{}", sample.serialize(None));
        let back = Sample::deserialize(&text).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn equality_is_field_wise() {
        let a = function_sample();
        let mut b = function_sample();
        assert_eq!(a, b);
        b.options.use_jit = false;
        assert_ne!(a, b);
        let mut c = function_sample();
        c.args_batch[0][0] = Value::bits(8, 0x2b);
        assert_ne!(a, c);
    }

    #[test]
    fn quote_unquote_roundtrip() {
        for text in ["plain", "with \"quotes\"", "back\\slash", "multi\nline"] {
            assert_eq!(unquote(&quote(text)).unwrap(), text);
        }
        assert!(unquote("no quotes").is_err());
    }
}
