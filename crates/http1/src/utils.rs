//! Internal helpers shared by the codec and the connection.

/// Returns `Err($error.into())` from the enclosing function unless `$predicate` holds.
///
/// ```ignore
/// ensure!(line.len() <= max_length, ParseError::line_too_long(max_length));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error.into());
        }
    };
}

pub(crate) use ensure;
