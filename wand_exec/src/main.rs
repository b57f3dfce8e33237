//! # Haptic Wand Executable
//!
//! Renders a virtual spring on the haptic wand.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Calibrate the wand, with the operator holding it in its calibration pose
//!     - Start the wand controller
//!     - Main loop, once per encoder sample:
//!         - Joint angle and pose determination
//!         - Force law evaluation
//!         - Force control processing
//!         - Amplifier drive
//!     - Stop the wand controller on Ctrl-C, or when the board has no more samples
//!
//! Passing `-y` skips the calibration prompt.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use std::env;
use std::io::{self, BufRead};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

// Internal
use hil_if::sim::SimWand;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};
use wand_lib::{
    force_ctrl,
    force_law::SpringLaw,
    params::WandExecParams,
    wand_ctrl::WandCtrl,
};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("wand_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Haptic Wand Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);
    let auto_confirm = args.iter().skip(1).any(|a| a == "-y");

    // ---- LOAD PARAMETERS ----

    let exec_params: WandExecParams =
        util::params::load("wand_exec.toml").wrap_err("Could not load exec params")?;
    let force_ctrl_params: force_ctrl::Params =
        util::params::load("force_ctrl.toml").wrap_err("Could not load force control params")?;

    info!("Parameters loaded");
    info!(
        "Using simulated {} board \"{}\"",
        exec_params.hil.board_type, exec_params.hil.board_identifier
    );
    info!("Channels: {}", exec_params.hil.channels);

    // ---- STOP HANDLER ----

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- WAND INITIALISATION ----

    let hw = SimWand::new(exec_params.sim.clone(), exec_params.sim_faults.clone());
    let mut wand = WandCtrl::new(hw, exec_params.wand_ctrl.clone(), force_ctrl_params)
        .wrap_err("Failed to initialise wand control")?;

    wand.calibrate(|| {
        auto_confirm
            || confirm(
                "Place the wand in its calibration pose and press Enter to continue, or enter q \
                to quit",
            )
    })
    .wrap_err("Failed to calibrate the wand")?;

    wand.start().wrap_err("Failed to start the wand")?;

    info!("Wand running, press Ctrl-C to stop");

    // ---- MAIN LOOP ----

    let mut law = SpringLaw::new(&exec_params.spring);
    let summary = wand
        .run(&stop, &mut law)
        .wrap_err("Wand control terminated with an error")?;

    session.save("run_summary.json", &summary);

    info!("End of execution");

    Ok(())
}

/// Ask the operator to confirm an action on the terminal.
///
/// Returns false if the operator entered `q` or stdin could not be read.
fn confirm(prompt: &str) -> bool {
    info!("{}", prompt);

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => !line.trim().eq_ignore_ascii_case("q"),
        Err(e) => {
            warn!("Could not read from stdin: {}", e);
            false
        }
    }
}
