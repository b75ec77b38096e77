pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_state {
    ($expr:expr) => {{
        let result = $expr;
        $crate::result::verify_state(result, stringify!($expr))?;
    }};
}

pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(crate::error::ErrorKind::InvalidArgument {
            name: name.to_string(),
            message: condition.to_string(),
        }
        .into())
    }
}

pub fn verify_state(predicate: bool, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(crate::error::ErrorKind::InvalidState {
            message: condition.to_string(),
        }
        .into())
    }
}
