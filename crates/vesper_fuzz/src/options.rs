//! The flat options record controlling a fuzzer run.

use serde::{Deserialize, Serialize};

/// What kind of unit the sample exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// A pure function driven by argument batches.
    Function,
    /// A proc driven by per-channel input sequences.
    Proc,
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleType::Function => write!(f, "function"),
            SampleType::Proc => write!(f, "proc"),
        }
    }
}

impl std::str::FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(SampleType::Function),
            "proc" => Ok(SampleType::Proc),
            other => Err(format!("unknown sample type '{other}'")),
        }
    }
}

/// The flat record of per-sample pipeline options.
///
/// Every field maps to one line of the crasher config record. Optional
/// fields are omitted from the record when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Whether the input text is HDL source (as opposed to IR text).
    pub input_is_hdl: bool,
    /// What kind of unit the sample exercises.
    pub sample_type: SampleType,
    /// Extra flags for the IR converter.
    pub ir_converter_args: Vec<String>,
    /// Whether to convert the input to IR.
    pub convert_to_ir: bool,
    /// Whether to run the optimization pipeline.
    pub optimize_ir: bool,
    /// Whether to execute with the JIT rather than the interpreter.
    pub use_jit: bool,
    /// Whether to run code generation.
    pub codegen: bool,
    /// Extra flags for code generation.
    pub codegen_args: Vec<String>,
    /// Whether to simulate the generated netlist.
    pub simulate: bool,
    /// The simulator to use, when simulating.
    pub simulator: Option<String>,
    /// Whether codegen emits SystemVerilog rather than Verilog.
    pub use_system_verilog: bool,
    /// Per-sample timeout in seconds.
    pub timeout_seconds: Option<u64>,
    /// Number of argument batches to run for a function sample.
    pub calls_per_sample: u64,
    /// Number of ticks to run for a proc sample.
    pub proc_ticks: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            input_is_hdl: true,
            sample_type: SampleType::Function,
            ir_converter_args: Vec::new(),
            convert_to_ir: true,
            optimize_ir: true,
            use_jit: true,
            codegen: false,
            codegen_args: Vec::new(),
            simulate: false,
            simulator: None,
            use_system_verilog: true,
            timeout_seconds: None,
            calls_per_sample: 1,
            proc_ticks: None,
        }
    }
}

impl SampleOptions {
    /// Returns `true` for function samples.
    pub fn is_function_sample(&self) -> bool {
        self.sample_type == SampleType::Function
    }

    /// Returns `true` for proc samples.
    pub fn is_proc_sample(&self) -> bool {
        self.sample_type == SampleType::Proc
    }
}
