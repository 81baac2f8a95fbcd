use crate::error::DebtFractionError;
use crate::record::DebtFractionInputs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// The contract of an external debt-fraction model: one parameter record in,
/// one debt fraction in percent (0-100) out.
///
/// `Send + Sync` lets one solver serve the runs of a parallel batch.
pub trait DebtFractionSolver: Send + Sync {
    fn solve(&self, inputs: &DebtFractionInputs) -> Result<f64, DebtFractionError>;
}

impl<F> DebtFractionSolver for F
where
    F: Fn(&DebtFractionInputs) -> Result<f64, DebtFractionError> + Send + Sync,
{
    fn solve(&self, inputs: &DebtFractionInputs) -> Result<f64, DebtFractionError> {
        self(inputs)
    }
}

/// Runs an external program per record. The record is written to its stdin as
/// JSON and the first token of its stdout is read as the percentage.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSolver {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

impl DebtFractionSolver for CommandSolver {
    fn solve(&self, inputs: &DebtFractionInputs) -> Result<f64, DebtFractionError> {
        let payload = serde_json::to_vec(inputs)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&payload) {
                // The child stopped reading; reap it before reporting.
                child.kill().ok();
                child.wait().ok();
                return Err(e.into());
            }
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(DebtFractionError::Solver(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let token = stdout.split_whitespace().next().unwrap_or_default();
        let percent = token
            .parse::<f64>()
            .map_err(|_| DebtFractionError::InvalidOutput(token.to_string()))?;
        debug!(percent, "Solver returned");
        Ok(percent)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn record() -> DebtFractionInputs {
        serde_json::from_str(
            r#"{"CF":0.93,"OCC":6115.0,"CFC":1615.0,"Fixed O&M":152.0,"Variable O&M":2.0,
                "DSCR":1.45,"Rate of Return on Equity Nominal":0.11,
                "Tax Rate (Federal and State)":0.257,"Inflation Rate":0.025,
                "Interest Rate Nominal":0.08,"Calculated Rate of Return on Equity Real":0.083,
                "ITC":0.3,"PTC":0,"MACRS":"MACRS-6","Fuel":7.0,"Heat Rate":10.45}"#,
        )
        .unwrap()
    }

    #[test]
    fn reads_the_first_token_of_stdout() {
        let solver = CommandSolver::new("sh", vec!["-c".into(), "cat > /dev/null; echo '48.9 percent'".into()]);
        assert_eq!(solver.solve(&record()).unwrap(), 48.9);
    }

    #[test]
    fn record_is_sent_on_stdin() {
        let script = "grep -q '\"Heat Rate\":10.45' && echo 1 || echo 0";
        let solver = CommandSolver::new("sh", vec!["-c".into(), script.into()]);
        assert_eq!(solver.solve(&record()).unwrap(), 1.0);
    }

    #[test]
    fn failures_are_reported() {
        let failing = CommandSolver::new("sh", vec!["-c".into(), "cat > /dev/null; echo boom >&2; exit 3".into()]);
        assert!(matches!(failing.solve(&record()), Err(DebtFractionError::Solver(msg)) if msg.contains("boom")));

        let garbage = CommandSolver::new("sh", vec!["-c".into(), "cat > /dev/null; echo n/a".into()]);
        assert!(matches!(garbage.solve(&record()), Err(DebtFractionError::InvalidOutput(_))));
    }

    #[test]
    fn solver_that_closes_stdin_is_reaped() {
        let mut large = record();
        large.macrs = "x".repeat(1 << 20);
        let deaf = CommandSolver::new("sh", vec!["-c".into(), "exec 0<&-; sleep 30".into()]);

        let started = std::time::Instant::now();
        let err = deaf.solve(&large).unwrap_err();
        assert!(matches!(&err, DebtFractionError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe), "{err}");
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
    }
}
