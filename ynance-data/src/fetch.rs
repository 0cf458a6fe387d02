use crate::error::DataError;

/// Outcome of a single data-source request.
///
/// Callers decide how to degrade: keep rendering stale data on [`Fetched::Transient`], or show
/// the feature as disabled on [`Fetched::Permanent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    Transient(DataError),
    Permanent(DataError),
}

impl<T> Fetched<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }

    pub fn error(&self) -> Option<&DataError> {
        match self {
            Fetched::Ready(_) => None,
            Fetched::Transient(error) | Fetched::Permanent(error) => Some(error),
        }
    }

    /// User-visible warning line for a failed fetch.
    pub fn warning(&self, source: &str) -> Option<String> {
        self.error().map(|error| error.warning(source))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Fetched::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Ready(data) => Fetched::Ready(f(data)),
            Fetched::Transient(error) => Fetched::Transient(error),
            Fetched::Permanent(error) => Fetched::Permanent(error),
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Data on success, otherwise an empty value.
    pub fn into_data(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<Result<T, DataError>> for Fetched<T> {
    fn from(result: Result<T, DataError>) -> Self {
        match result {
            Ok(data) => Fetched::Ready(data),
            Err(error) if error.is_transient() => Fetched::Transient(error),
            Err(error) => Fetched::Permanent(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    #[test]
    fn test_from_result_classifies_errors() {
        let ready: Fetched<Vec<u8>> = Ok(vec![1]).into();
        assert_eq!(ready, Fetched::Ready(vec![1]));

        let transient: Fetched<Vec<u8>> = Err(DataError::Timeout).into();
        assert!(matches!(transient, Fetched::Transient(DataError::Timeout)));

        let permanent: Fetched<Vec<u8>> =
            Err(DataError::MissingCredential(Provider::Fred)).into();
        assert!(matches!(permanent, Fetched::Permanent(_)));
    }

    #[test]
    fn test_failures_degrade_to_empty_data() {
        let failed: Fetched<Vec<u8>> = Fetched::Permanent(DataError::Parse("bad".into()));
        assert_eq!(failed.warning("FRED"), Some("FRED: unexpected response shape: bad".into()));
        assert!(failed.into_data().is_empty());

        let ready = Fetched::Ready(vec![1, 2]);
        assert_eq!(ready.warning("FRED"), None);
        assert_eq!(ready.map(|v| v.len()).into_data(), 2);
    }
}
