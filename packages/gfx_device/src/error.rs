use thiserror::Error;

/// Why a draw call was refused.
///
/// Native resource failures inside a draw are not reported here; the backend logs them and
/// the call degrades to a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("operation is not supported by this backend")]
    Unsupported,
    #[error("path was not created by this backend")]
    IncompatiblePath,
    #[error("gradient was not created by this backend")]
    IncompatibleGradient,
    #[error("bitmap has no native pixel source")]
    MissingBitmapSource,
    #[error("no device bitmap could be obtained for this context")]
    BitmapUnavailable,
    #[error("polygon needs at least one point")]
    EmptyPolygon,
    #[error("restore without a matching save")]
    UnbalancedRestore,
}

pub type DrawResult = Result<(), DrawError>;
