use crate::formatter::*;

/// A formatter that produces no output.
///
/// `NoFormatter` discards every event. This is useful when we want to run tests
/// without any formatting (for example in the harness' own tests or when
/// embedding synctest into another system that handles its own reporting
/// through the returned [`TestReport`](crate::TestReport)).
#[derive(Debug, Default, Clone)]
pub struct NoFormatter;

macro_rules! impl_unit_from {
    [$($name:ident),* $(,)?] => {$(
        impl From<$name> for () {
            fn from(_: $name) -> () {}
        })*
    };
}

impl_unit_from![FmtRunStart, FmtTestStart, FmtTestOutcome, FmtRunOutcomes];

impl TestFormatter for NoFormatter {
    type Error = ();
    type RunStart = ();
    type TestStart = ();
    type TestOutcome = ();
    type RunOutcomes = ();
}
