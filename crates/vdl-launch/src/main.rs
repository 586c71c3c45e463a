use std::io;
use std::process::ExitCode;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use vdl_core::error::FATAL_EXIT_CODE;
use vdl_core::flags::set_flag;
use vdl_core::guard::check_overlay_consistency;
use vdl_core::host_tools::{host_tools_fingerprint, host_tools_updated};
use vdl_core::metrics::confirm_metrics;
use vdl_core::paths::{host_artifacts_path, host_tools_dir, own_dir, platform_env, subtool_path};
use vdl_core::{
    ConfigStore, CoreError, FileReport, FlagForwarder, InstanceNumsCalculator, JsonConfigStore,
    LaunchFlags, LaunchPlan, Orchestrator, PassthroughForwarder, normalize_bool_args,
};
use vdl_exec::{ExecError, sched};
use vdl_model::{LaunchOutcome, Subtool};
use vdl_observe::{FileSink, LoggerConfig, logger_init};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match try_main(args) {
        Ok(code) => code,
        Err(err) => {
            let code = err
                .downcast_ref::<CoreError>()
                .map_or(FATAL_EXIT_CODE, CoreError::exit_code);
            if tracing::dispatcher::has_been_set() {
                error!(target: "vdl.launch", "{err:#}");
            } else {
                eprintln!("launch_vd: {err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn try_main(mut args: Vec<String>) -> anyhow::Result<ExitCode> {
    // 1) Flags
    let normalized = normalize_bool_args(&mut args);
    let flags = LaunchFlags::parse(&args).map_err(CoreError::from)?;
    if flags.help {
        print!("{}", LaunchFlags::usage());
        return Ok(ExitCode::SUCCESS);
    }

    // 2) Logger
    let cfg = LoggerConfig {
        format: flags.log_format,
        console: flags.verbosity,
        file: flags.launcher_log.clone().map(|path| FileSink {
            path,
            verbosity: flags.file_verbosity,
        }),
        ..Default::default()
    };
    logger_init(&cfg).context("failed to initialize logging")?;
    if normalized {
        debug!(target: "vdl.launch", ?args, "normalized boolean flags");
    }

    // 3) Scheduling
    if flags.share_sched_core {
        match sched::share_sched_core() {
            Ok(()) => debug!(target: "vdl.launch", "sharing the scheduling core"),
            Err(ExecError::Unsupported(what)) => {
                error!(target: "vdl.launch", "{what} is not supported on this platform")
            }
            Err(e) => trace!(target: "vdl.launch", error = %e, "failed to share the scheduling core"),
        }
    }

    // 4) Everything the launch needs, resolved before any process starts
    let (forwarder, plan) = prepare(&mut args, &flags)?;
    info!(
        target: "vdl.launch",
        assembler = %plan.assembler.display(),
        runner = %plan.runner.display(),
        instances = plan.instances.len(),
        "launch plan ready"
    );

    // 5) Launch
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let outcome = runtime.block_on(launch(&forwarder, &plan))?;

    if outcome.is_success() {
        info!(target: "vdl.launch", "all instances exited successfully");
    }
    Ok(ExitCode::from(outcome.exit_code()))
}

fn prepare(
    args: &mut Vec<String>,
    flags: &LaunchFlags,
) -> Result<(PassthroughForwarder, LaunchPlan), CoreError> {
    let mut forwarder = PassthroughForwarder::new();
    if let Some(dir) = flags.system_image_dir.as_deref() {
        forwarder = forwarder.with_fixed(
            Subtool::Assembler,
            vec![format!("--system_image_dir={dir}")],
        );
    }
    forwarder.update_flag_defaults()?;

    let store = JsonConfigStore::from_env()?;
    let previous = store.snapshot()?;
    trace!(target: "vdl.launch", path = %store.path().display(), found = previous.is_some(), "persisted config");

    let answer = confirm_metrics(
        &flags.report_anonymous_usage_stats,
        previous.as_ref(),
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )
    .map_err(ExecError::from)?;
    set_flag(args, "report_anonymous_usage_stats", answer);

    let artifacts = host_artifacts_path();
    if flags.track_host_tools_crc {
        match host_tools_fingerprint(&host_tools_dir(&artifacts)) {
            Ok(current) => {
                let changed = host_tools_updated(previous.as_ref(), &current);
                info!(target: "vdl.launch", "host changed from last run: {changed}");
            }
            Err(e) => warn!(target: "vdl.launch", error = %e, "could not fingerprint host tools"),
        }
    }

    let instances = InstanceNumsCalculator::from_flags(flags).calculate()?;
    check_overlay_consistency(previous.as_ref(), flags.use_overlay)?;

    let file_report = if flags.run_file_discovery {
        let cwd = std::env::current_dir().map_err(ExecError::from)?;
        Some(FileReport::from_fetcher_config(&cwd)?)
    } else {
        None
    };

    let own = own_dir();
    let plan = LaunchPlan {
        assembler: subtool_path(Subtool::Assembler, own.as_deref(), &artifacts),
        runner: subtool_path(Subtool::Runner, own.as_deref(), &artifacts),
        args: args.clone(),
        instances,
        file_report,
        env: LaunchPlan::log_env(flags.verbosity, flags.file_verbosity)
            .merged(&platform_env(&artifacts)),
    };
    Ok((forwarder, plan))
}

async fn launch(
    forwarder: &PassthroughForwarder,
    plan: &LaunchPlan,
) -> Result<LaunchOutcome, CoreError> {
    let token = CancellationToken::new();
    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(target: "vdl.launch", "interrupted, stopping subprocesses");
                token.cancel();
            }
        })
    };

    let result = Orchestrator::new(forwarder)
        .with_cancellation(token)
        .launch(plan)
        .await;
    interrupt.abort();
    result
}
