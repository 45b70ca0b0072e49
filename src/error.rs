use std::path::PathBuf;
use thiserror::Error;

/// Error codes returned across the engine boundary.
///
/// The set is closed: every boundary call either succeeds or yields exactly one
/// of these variants. The numeric codes match the wire protocol, with `0`
/// reserved for success (see [`check_code`]).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EngineError {
    #[error("unknown engine error")]
    Unknown = 1,
    #[error("access denied: the engine is busy")]
    AccessDenied = 2,
    #[error("invalid pointer")]
    InvalidPointer = 3,
    #[error("invalid file format")]
    InvalidFileFormat = 4,
    #[error("invalid path type")]
    InvalidPathType = 5,
    #[error("invalid options type")]
    InvalidOptionsType = 6,
    #[error("invalid file type")]
    InvalidFileType = 7,
    #[error("invalid sort type")]
    InvalidSortType = 8,
    #[error("invalid global action type")]
    InvalidGlobalActionType = 9,
    #[error("invalid thread id")]
    InvalidThreadId = 10,
    #[error("invalid start position")]
    InvalidStartPosition = 11,
    #[error("output buffer is too small")]
    OutputBufferIsTooSmall = 12,
    #[error("file does not exist")]
    FileIsNotExists = 13,
    #[error("can't open file")]
    CantOpenFile = 14,
    #[error("can't create file")]
    CantCreateFile = 15,
    #[error("can't read file")]
    CantReadFile = 16,
    #[error("can't write file")]
    CantWriteFile = 17,
    #[error("invalid file name")]
    InvalidFileName = 18,
    #[error("invalid local action type")]
    InvalidLocalActionType = 19,
    #[error("invalid target type")]
    InvalidTargetType = 20,
    #[error("invalid index")]
    InvalidIndex = 21,
    #[error("nothing to act on")]
    ZeroTarget = 22,
    #[error("path too long")]
    PathTooLong = 23,
    #[error("can't load image")]
    CantLoadImage = 24,
    #[error("invalid bitmap")]
    InvalidBitmap = 25,
    #[error("invalid thread type")]
    InvalidThreadType = 26,
    #[error("invalid action enable type")]
    InvalidActionEnableType = 27,
    #[error("invalid parameter combination")]
    InvalidParameterCombination = 28,
    #[error("invalid rename current type")]
    InvalidRenameCurrentType = 29,
    #[error("invalid info type")]
    InvalidInfoType = 30,
    #[error("invalid group id")]
    InvalidGroupId = 31,
    #[error("invalid selection type")]
    InvalidSelectionType = 32,
}

pub type EngineResult<T> = Result<T, EngineError>;

const ALL_ERRORS: [EngineError; 32] = [
    EngineError::Unknown,
    EngineError::AccessDenied,
    EngineError::InvalidPointer,
    EngineError::InvalidFileFormat,
    EngineError::InvalidPathType,
    EngineError::InvalidOptionsType,
    EngineError::InvalidFileType,
    EngineError::InvalidSortType,
    EngineError::InvalidGlobalActionType,
    EngineError::InvalidThreadId,
    EngineError::InvalidStartPosition,
    EngineError::OutputBufferIsTooSmall,
    EngineError::FileIsNotExists,
    EngineError::CantOpenFile,
    EngineError::CantCreateFile,
    EngineError::CantReadFile,
    EngineError::CantWriteFile,
    EngineError::InvalidFileName,
    EngineError::InvalidLocalActionType,
    EngineError::InvalidTargetType,
    EngineError::InvalidIndex,
    EngineError::ZeroTarget,
    EngineError::PathTooLong,
    EngineError::CantLoadImage,
    EngineError::InvalidBitmap,
    EngineError::InvalidThreadType,
    EngineError::InvalidActionEnableType,
    EngineError::InvalidParameterCombination,
    EngineError::InvalidRenameCurrentType,
    EngineError::InvalidInfoType,
    EngineError::InvalidGroupId,
    EngineError::InvalidSelectionType,
];

impl EngineError {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        ALL_ERRORS.iter().copied().find(|e| e.code() == code)
    }
}

/// Decode a raw status code: `0` is success, anything unrecognised is `Unknown`.
pub fn check_code(code: i32) -> EngineResult<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(EngineError::from_code(code).unwrap_or(EngineError::Unknown))
    }
}

/// Errors surfaced to callers of the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("incompatible engine version {found}, expected major version {expected}")]
    IncompatibleVersion { found: String, expected: u32 },

    #[error("page fetch at position {start} failed: {source}")]
    Page { start: usize, source: EngineError },

    #[error("engine returned {got} records for a page of {expected}")]
    ShortPage { expected: usize, got: usize },

    #[error("options error: {0}")]
    Options(#[from] OptionsError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Local validation and persistence errors for the options store.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("the last search path can't be removed")]
    LastSearchPath,

    #[error("path index {index} is out of range for a list of {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("flat record for {kind} has {got} bytes, expected {expected}")]
    FlatSize {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid value {value} for field {field}")]
    FlatValue { field: &'static str, value: i32 },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read and write failures; quick-xml 0.36 uses `DeError` for both.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("unsupported options document version {0}")]
    Version(u32),

    #[error("invalid profile name: {0}")]
    ProfileName(String),
}

impl From<OptionsError> for EngineError {
    fn from(err: OptionsError) -> Self {
        match err {
            OptionsError::FlatSize { .. } => EngineError::InvalidOptionsType,
            OptionsError::FlatValue { .. } => EngineError::InvalidParameterCombination,
            OptionsError::LastSearchPath => EngineError::InvalidParameterCombination,
            OptionsError::InvalidIndex { .. } => EngineError::InvalidIndex,
            _ => EngineError::Unknown,
        }
    }
}
