//! Drive executable entry point.
//!
//! Runs the drive train against the simulated chassis:
//!
//!     - Initialise the session, logger and parameters
//!     - Build the simulation and the drive train on top of it
//!     - Drive field-oriented for a short teleop phase
//!     - Run the approach routine on the target nearest the final teleop heading, either one tick
//!       per cycle (default) or
//!       as a single blocking call (`drive_exec blocking`)
//!     - Archive the wheel demands, routine status and simulated pose every cycle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::{env, thread, time::{Duration, Instant}};

// Internal
use drive_lib::{
    approach_ctrl::{nearest_target, ApproachParams},
    drive_train::{DriveTrain, DriveTrainParams},
    loco_ctrl::LocoCtrlParams,
    sim::{Sim, SimParams},
    watchdog::Watchdog,
};
use util::{
    archive::{Archived, Archiver},
    logger::{logger_init, LevelFilter},
    params::LoadError,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles of the teleop phase.
const NUM_TELEOP_CYCLES: u64 = 50;

/// Give up on the cyclic routine after this many cycles.
const MAX_ROUTINE_CYCLES: u64 = 3000;

/// Time limit on the blocking routine.
const BLOCKING_TIMEOUT_S: u64 = 30;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("drive_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &[("drive_lib::sim", LevelFilter::Info)], &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Gearbot Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let blocking = match args.len() {
        1 => false,
        2 if args[1] == "blocking" => true,
        2 if args[1] == "tick" => false,
        _ => return Err(eyre!(
            "Usage: drive_exec [tick|blocking], found {} arguments", args.len() - 1
        )),
    };

    // ---- LOAD PARAMETERS ----

    let loco_ctrl_params: LocoCtrlParams = load_params("loco_ctrl.toml")
        .wrap_err("Could not load LocoCtrl params")?;
    let approach_params: ApproachParams = load_params("approach.toml")
        .wrap_err("Could not load approach params")?;
    let drive_train_params: DriveTrainParams = load_params("drive_train.toml")
        .wrap_err("Could not load drive train params")?;
    let sim_params: SimParams = load_params("sim.toml")
        .wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let Sim { world, wheels, gyro, mut eqpt } = Sim::new(sim_params);

    let mut drive_train = DriveTrain::new(
        wheels,
        gyro,
        drive_train_params,
        loco_ctrl_params,
        approach_params,
    );
    drive_train.arch_init(&session)
        .wrap_err("Failed to initialise the drive train archives")?;
    drive_train.reset_heading();
    drive_train.zero_encoders();

    let mut arch_pose = Archiver::from_path(&session, "sim/pose.csv")
        .wrap_err("Failed to initialise the sim pose archive")?;

    info!("Module initialisation complete\n");

    // ---- TELEOP PHASE ----

    info!("Teleop phase: strafing right while turning");

    for _ in 0..NUM_TELEOP_CYCLES {
        let cycle_start_instant = Instant::now();

        // Stick to the right, twisting clockwise
        if let Err(e) = drive_train.mecanum_drive(0.3, 0.0, 0.3) {
            warn!("Teleop drive error: {}", e);
        }

        write_archives(&mut drive_train, &mut arch_pose, &world);
        sleep_until_period(cycle_start_instant);
    }

    drive_train.brake();
    drive_train.debug_heading();
    drive_train.debug_encoders();

    // ---- APPROACH ROUTINE ----

    let target = nearest_target(
        drive_train.heading_deg(),
        &drive_train.approach().params().target_headings_deg,
    );
    info!("Nearest target is {}", target);

    if blocking {
        let watchdog = Watchdog::with_timeout(Duration::from_secs(BLOCKING_TIMEOUT_S));
        drive_train.place_target_blocking(target, &mut eqpt, &watchdog)
            .wrap_err("Blocking approach routine failed")?;
        write_archives(&mut drive_train, &mut arch_pose, &world);
    }
    else {
        let mut num_cycles = 0;

        while drive_train.progress() < 5 {
            let cycle_start_instant = Instant::now();

            drive_train.place_target(target, &mut eqpt)
                .wrap_err("Approach routine tick failed")?;

            write_archives(&mut drive_train, &mut arch_pose, &world);

            num_cycles += 1;
            if num_cycles > MAX_ROUTINE_CYCLES {
                drive_train.brake();
                return Err(eyre!(
                    "Approach routine did not finish within {} cycles, stuck at stage {}",
                    MAX_ROUTINE_CYCLES,
                    drive_train.progress()
                ));
            }

            sleep_until_period(cycle_start_instant);
        }

        info!("Approach routine finished in {} cycles", num_cycles);
        drive_train.reset_routine(&mut eqpt.placement);
    }

    drive_train.brake();

    info!(
        "Payload placed: {}, final pose: {:?}",
        world.borrow().payload_placed(),
        world.borrow().pose()
    );

    Ok(())
}

/// Load a parameter file, using the defaults if the file doesn't exist.
fn load_params<P>(file: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned + Default,
{
    match util::params::load(file) {
        Ok(p) => Ok(p),
        Err(LoadError::FileLoadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("No \"{}\" found, using default parameters", file);
            Ok(P::default())
        }
        Err(e) => Err(e),
    }
}

fn write_archives<A, H>(
    drive_train: &mut DriveTrain<A, H>,
    arch_pose: &mut Archiver,
    world: &drive_lib::sim::SharedWorld,
) {
    if let Err(e) = drive_train.write() {
        warn!("Could not write drive train archives: {}", e);
    }
    if let Err(e) = arch_pose.serialise(world.borrow().pose()) {
        warn!("Could not write sim pose archive: {}", e);
    }
}

fn sleep_until_period(cycle_start_instant: Instant) {
    let cycle_dur = Instant::now() - cycle_start_instant;

    match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
        Some(d) => thread::sleep(d),
        None => warn!(
            "Cycle overran by {:.06} s",
            cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
        ),
    }
}
