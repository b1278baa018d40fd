use std::fs;
use std::path::Path;

pub use anyhow::{
    self,
    Result,
    Context,
    bail,
    ensure,
};
pub use ndarray;
pub use regex::Regex;
pub use log::{
    self,
    warn,
    info,
    debug,
    error,
};

pub mod numeric_methods;
pub mod trajectory;
pub use trajectory::CoordinateSequence;


/// Create `dir` and all of its missing parents. An existing directory is not an error.
pub fn ensure_dir<P>(dir: P) -> Result<()>
where P: AsRef<Path> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {:?}.", dir))?;
    Ok(())
}


/// Format a shape like `(3, 21, 3)`, the way array shapes are usually printed.
pub fn shape_str(shape: &[usize]) -> String {
    let inner = shape.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    if inner.len() == 1 {
        format!("({},)", inner[0])
    } else {
        format!("({})", inner.join(", "))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shape_str() {
        assert_eq!(shape_str(&[]), "()");
        assert_eq!(shape_str(&[21]), "(21,)");
        assert_eq!(shape_str(&[21, 3, 30]), "(21, 3, 30)");
    }

    #[test]
    fn test_ensure_dir() {
        let base = std::env::temp_dir().join(format!("shared_ensure_dir_{}", std::process::id()));
        let nested = base.join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
        fs::remove_dir_all(&base).unwrap();
    }
}
