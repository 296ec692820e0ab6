use dgscan_core::error::DgError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), DgError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
