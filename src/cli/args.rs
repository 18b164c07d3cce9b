use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// ResourceList to read (defaults to stdin)
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Where to write the resulting ResourceList (defaults to stdout)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path of the kcl executable (default: $KCL_BIN, then kcl on PATH)
    #[arg(long, value_name = "PATH")]
    pub kcl_bin: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// KCLRun resource to execute
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path of the kcl executable (default: $KCL_BIN, then kcl on PATH)
    #[arg(long, value_name = "PATH")]
    pub kcl_bin: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// KCLRun resource to validate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Multi-document YAML stream
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
