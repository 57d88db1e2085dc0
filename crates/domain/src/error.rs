#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no connection")]
    NoConnection,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl ReadError {
    #[must_use]
    pub fn is_no_connection(&self) -> bool {
        matches!(self, ReadError::Storage(StorageError::NoConnection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_from_storage_error() {
        assert!(matches!(
            ReadError::from(StorageError::NoConnection),
            ReadError::Storage(StorageError::NoConnection)
        ));
        assert!(matches!(
            ReadError::from(Box::<dyn std::error::Error>::from("foo")),
            ReadError::Other(error) if error.to_string() == "foo"
        ));
    }

    #[test]
    fn test_read_error_is_no_connection() {
        assert!(ReadError::from(StorageError::NoConnection).is_no_connection());
        assert!(!ReadError::from(StorageError::Other("foo".into())).is_no_connection());
        assert!(!ReadError::Other("foo".into()).is_no_connection());
    }
}
