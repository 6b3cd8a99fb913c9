use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Wsdl(#[from] lather_wsdl::error::Error),

    #[error("invalid value {value:?} for option {option}")]
    InvalidOption {
        option: &'static str,
        value: String,
    },

    #[error("services {first} and {second} both map to module {module:?}")]
    DuplicateModule {
        module: String,
        first: String,
        second: String,
    },
}
