use std::fmt;


/// A per-item problem which is reported but does not stop the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub subject: String,
    pub message: String,
}


impl Warning {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self { subject: subject.into(), message: message.into() }
    }
}


impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
