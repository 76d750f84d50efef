//! External Simulator Backend Tests.

use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;
use simwire_core::sim::external::parse_exit_line;
use simwire_core::sim::{ExitEvent, ExternalBackend};

// ══════════════════════════════════════════════════════════
// 1. Exit line and arguments
// ══════════════════════════════════════════════════════════

#[rstest]
#[case("Exiting @ tick 42 because done", Some(ExitEvent::new(42, "done")))]
#[case(
    "  Exiting @ tick 18446744073709551615 because simulate() limit reached\n",
    Some(ExitEvent::new(u64::MAX, "simulate() limit reached"))
)]
#[case("Exiting @ tick x because done", None)]
#[case("Exiting @ tick 42", None)]
#[case("Beginning simulation!", None)]
fn exit_lines(#[case] line: &str, #[case] expected: Option<ExitEvent>) {
    assert_eq!(parse_exit_line(line), expected);
}

#[test]
fn command_args_end_with_the_config() {
    let backend = ExternalBackend::new("sim", vec!["--quiet".into()]);
    let outdir = Path::new("out");

    assert_eq!(
        backend.command_args(outdir, None),
        vec!["--quiet", "--outdir", "out", "out/config.json"]
    );
    assert_eq!(
        backend.command_args(outdir, Some(500)),
        vec!["--quiet", "--abs-max-tick", "500", "--outdir", "out", "out/config.json"]
    );
}

// ══════════════════════════════════════════════════════════
// 2. Running a program
// ══════════════════════════════════════════════════════════

#[cfg(unix)]
mod process {
    use pretty_assertions::assert_eq;
    use simwire_core::common::error::SimError;
    use simwire_core::sim::{Backend, ExternalBackend};
    use simwire_core::Config;
    use tempfile::TempDir;

    use crate::common::fixtures::{Fixture, write_file};

    fn backend_running(script: &str) -> (TempDir, ExternalBackend) {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "sim.sh", script);
        let backend = ExternalBackend::new("/bin/sh", vec![path.display().to_string()]);
        (dir, backend)
    }

    fn instantiate(backend: &mut ExternalBackend, dir: &TempDir) {
        let f = Fixture::riscv();
        let system = f.freeze(&Config::default(), 1);
        backend.instantiate(&system, dir.path()).unwrap();
    }

    #[test]
    fn last_exit_line_wins() {
        let (dir, mut backend) = backend_running(
            "echo 'Exiting @ tick 10 because simulate() limit reached'\n\
             echo 'Exiting @ tick 99 because target called exit()'\n",
        );
        instantiate(&mut backend, &dir);
        let exit = backend.simulate(None).unwrap();
        assert_eq!(exit.tick, 99);
        assert_eq!(exit.cause, "target called exit()");
        assert!(backend.stats().is_none());
    }

    #[test]
    fn arguments_reach_the_program() {
        let (dir, mut backend) =
            backend_running("echo \"Exiting @ tick $2 because args $#\"\n");
        instantiate(&mut backend, &dir);
        let exit = backend.simulate(Some(7)).unwrap();
        assert_eq!(exit.tick, 7);
        assert_eq!(exit.cause, "args 5");
    }

    #[test]
    fn clean_exit_without_event_stops_at_zero() {
        let (dir, mut backend) = backend_running("exit 0\n");
        instantiate(&mut backend, &dir);
        assert_eq!(backend.simulate(None).unwrap().tick, 0);
    }

    #[test]
    fn failure_without_event_is_an_error() {
        let (dir, mut backend) = backend_running("exit 3\n");
        instantiate(&mut backend, &dir);
        let err = backend.simulate(None).unwrap_err();
        assert!(matches!(err, SimError::External { .. }), "{err}");
    }

    #[test]
    fn unreadable_output_stops_the_program() {
        let (dir, mut backend) = backend_running("printf '\\377\\376\\n'\nsleep 30\n");
        instantiate(&mut backend, &dir);

        let started = std::time::Instant::now();
        let err = backend.simulate(None).unwrap_err();
        assert!(matches!(err, SimError::Output { .. }), "{err}");
        assert!(started.elapsed().as_secs() < 20);
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let mut backend = ExternalBackend::new(dir.path().join("nope"), Vec::new());
        instantiate(&mut backend, &dir);
        assert!(matches!(backend.simulate(None), Err(SimError::Spawn { .. })));
    }

    #[test]
    fn simulate_needs_instantiate() {
        let (_dir, mut backend) = backend_running("exit 0\n");
        assert!(matches!(backend.simulate(None), Err(SimError::NotInstantiated)));
    }
}
