#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("varint longer than {max_bytes} bytes")]
    VarIntTooLong { max_bytes: usize },

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("invalid inventory transaction type: {0}")]
    InvalidTransactionType(u32),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
