use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),

    #[error("unsupported format feature: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {node} out of range for graph with {node_count} nodes")]
    NodeOutOfRange { node: usize, node_count: usize },

    #[error("self loop at node {0}")]
    SelfLoop(usize),

    #[error("graph is not connected")]
    Disconnected,

    #[error("graph is not a tree: {0}")]
    NotATree(String),

    #[error("graph has no nodes")]
    Empty,

    #[error("{node_count} nodes exceed the limit of {limit}")]
    TooManyNodes { node_count: usize, limit: usize },

    #[error("cannot allocate {0} nodes")]
    Allocation(usize),

    #[error("weight sum overflows")]
    WeightOverflow,
}

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerateError {
    #[error("invalid generator parameter: {0}")]
    InvalidParameter(String),

    #[error("cannot attach node {node}: every candidate parent has reached max degree {max_degree}")]
    DegreeExhausted { node: usize, max_degree: usize },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RationalError {
    #[error("denominator must not be zero")]
    ZeroDenominator,

    #[error("cannot parse rational from '{0}'")]
    Parse(String),

    #[error("arithmetic overflow")]
    Overflow,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartitionError {
    #[error("part count must be at least 1, got {0}")]
    InvalidPartCount(usize),

    #[error("imbalance must be positive, got {0}")]
    InvalidImbalance(String),

    #[error("tree and graph disagree: {0}")]
    Mismatch(String),

    #[error("no cut of the tree can be packed into {part_cnt} parts")]
    Infeasible { part_cnt: usize },

    #[error("signature not present at the root: {0:?}")]
    UnknownSignature(Vec<u32>),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Rational(#[from] RationalError),
}

pub type PartitionResult<T> = Result<T, PartitionError>;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {message}")]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("invalid setting {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("environment: {0}")]
    Environment(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
