/// Script parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptParseError {
    /// The script contained no panel blocks at all.
    #[error("no panels found")]
    NoPanelsFound,

    /// Panel blocks were found but none carried a usable panel number.
    #[error("no extractable panel data")]
    NoExtractableData,
}
