/*!
Error printer for the `dpllsat` binary.
*/

use std::{error::Error as StdError, fmt, iter};

/// Any error returned from `main`.
///
/// Debug formatting prints the error and then every `source()` below it,
/// numbered from the outermost cause.
pub struct Report {
    error: Box<dyn StdError>,
}

impl Report {
    pub fn error(&self) -> &(dyn StdError + 'static) {
        self.error.as_ref()
    }

    /// Errors beneath the outermost one, outermost first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> + '_ {
        iter::successors(self.error.source(), |&cause| cause.source())
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.error)?;

        let mut causes = self.causes().enumerate().peekable();
        if causes.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
        }
        for (depth, cause) in causes {
            writeln!(f, "  {}: {}", depth, cause)?;
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(error: E) -> Self {
        Report {
            error: error.into(),
        }
    }
}
