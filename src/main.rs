use energy_controller::client::{ApiClient, ClientError};
use energy_controller::config::Config;
use energy_controller::dotenv::{self, ENV_FILE_FLAG};
use energy_controller::models::energy::{
    DeviceId, DevicePayload, NewTelemetry, SimulatorConfig, SummaryPeriod, TelemetryId,
};
use energy_controller::session::Session;
use energy_controller::settings::simulation::SimulationModes;
use energy_controller::settings::thresholds::{DeviceThresholds, Thresholds};
use energy_controller::storage::{FileStore, KeyValueStore};
use log::{debug, error, info};
use serde::Serialize;
use std::rc::Rc;

const USAGE: &str = "usage: energyctl [--env-file PATH] <command> [args...]

commands:
  login EMAIL PASSWORD | signup NAME EMAIL PASSWORD | logout | me
  devices list | get ID | create NAME [ROOM] [TYPE] | rename ID NAME | delete ID | toggle ID | connect ID
  telemetry list [DEVICE_ID] [LIMIT] | device ID [LIMIT] | latest [DEVICE_ID]
            summary ID [day|week|month] | add DEVICE_ID POWER [VOLTAGE] [CURRENT] | delete ID
  simulate one ID [BASE_POWER] | bulk ID [COUNT]
  sim-mode list | get ID | set ID on|off | toggle ID
  thresholds list | get ID | set ID WARNING DANGER | remove ID | check ID POWER";

struct App {
    client: ApiClient,
    simulation: SimulationModes,
    thresholds: Thresholds,
}

impl App {
    fn new(cfg: &Config) -> Self {
        let store: Rc<dyn KeyValueStore> = Rc::new(FileStore::new(&cfg.state_dir));
        let session = Session::hydrate(store.clone()).into_shared();
        App {
            client: ApiClient::new(&cfg.api_url, session),
            simulation: SimulationModes::new(store.clone()),
            thresholds: Thresholds::new(store),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let s = serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode output: {}", e))?;
    println!("{}", s);
    Ok(())
}

fn api_err(op: &str) -> impl FnOnce(ClientError) -> String + '_ {
    move |e| match e.api_error() {
        Some(msg) => format!("{} failed: {}", op, msg),
        None => format!("{} failed: {}", op, e),
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument <{}>\n\n{}", name, USAGE))
}

fn parse<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| format!("invalid {} {:?}: {}", name, raw, e))
}

fn device_arg(args: &[String], index: usize) -> Result<DeviceId, String> {
    parse(arg(args, index, "device id")?, "device id").map(DeviceId)
}

fn optional<T: std::str::FromStr>(args: &[String], index: usize, name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    args.get(index).map(|raw| parse(raw, name)).transpose()
}

fn run(args: &[String]) -> Result<(), String> {
    let cfg = Config::from_env()?;
    debug!("Config loaded (api_url={}, state_dir={})", cfg.api_url, cfg.state_dir.display());
    let app = App::new(&cfg);

    let (command, rest) = args.split_first().ok_or_else(|| USAGE.to_string())?;
    match command.as_str() {
        "login" | "signup" | "logout" | "me" => run_auth(&app, command, rest),
        "devices" => run_devices(&app, rest),
        "telemetry" => run_telemetry(&app, rest),
        "simulate" => run_simulate(&app, rest),
        "sim-mode" => run_sim_mode(&app, rest),
        "thresholds" => run_thresholds(&app, rest),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => Err(format!("unknown command: {}\n\n{}", other, USAGE)),
    }
}

fn run_auth(app: &App, command: &str, args: &[String]) -> Result<(), String> {
    let client = &app.client;
    match command {
        "login" => {
            let user = client
                .login(arg(args, 0, "email")?, arg(args, 1, "password")?)
                .map_err(api_err("login"))?;
            print_json(&user)
        }
        "signup" => {
            let email = arg(args, 1, "email")?;
            client
                .signup(arg(args, 0, "name")?, email, arg(args, 2, "password")?)
                .map_err(api_err("signup"))?;
            info!("Account {} created; log in to start a session", email);
            Ok(())
        }
        "logout" => {
            client.logout();
            Ok(())
        }
        "me" => {
            if !client.session().borrow().is_authenticated() {
                return Err("not logged in".to_string());
            }
            let user = client.fetch_profile().map_err(api_err("fetch profile"))?;
            print_json(&user)
        }
        _ => unreachable!("dispatched by run"),
    }
}

fn run_devices(app: &App, args: &[String]) -> Result<(), String> {
    let client = &app.client;
    match arg(args, 0, "devices subcommand")? {
        "list" => print_json(&client.list_devices().map_err(api_err("list devices"))?),
        "get" => print_json(&client.get_device(device_arg(args, 1)?).map_err(api_err("get device"))?),
        "create" => {
            let payload = DevicePayload {
                room: args.get(2).cloned(),
                device_type: args.get(3).cloned(),
                ..DevicePayload::named(arg(args, 1, "name")?)
            };
            print_json(&client.create_device(&payload).map_err(api_err("create device"))?)
        }
        "rename" => {
            let id = device_arg(args, 1)?;
            let payload = DevicePayload::named(arg(args, 2, "name")?);
            print_json(&client.update_device(id, &payload).map_err(api_err("update device"))?)
        }
        "delete" => client.delete_device(device_arg(args, 1)?).map_err(api_err("delete device")),
        "toggle" => print_json(&client.toggle_device(device_arg(args, 1)?).map_err(api_err("toggle device"))?),
        "connect" => {
            let id = device_arg(args, 1)?;
            match client.test_device_connection(id) {
                Ok(reading) => {
                    info!("Device {} answered a live read", id);
                    print_json(&reading)
                }
                Err(e) if e.api_error() == Some("device not configured for live reads") => Err(format!(
                    "device {} has no live connection configured; enable simulation mode with `energyctl sim-mode set {} on`",
                    id, id
                )),
                Err(e) => Err(api_err("connect")(e)),
            }
        }
        other => Err(format!("unknown devices subcommand: {}", other)),
    }
}

fn run_telemetry(app: &App, args: &[String]) -> Result<(), String> {
    let client = &app.client;
    match arg(args, 0, "telemetry subcommand")? {
        "list" => {
            let device = optional::<i64>(args, 1, "device id")?.map(DeviceId);
            let limit = optional(args, 2, "limit")?;
            print_json(&client.list_telemetry(device, limit).map_err(api_err("list telemetry"))?)
        }
        "device" => {
            let id = device_arg(args, 1)?;
            let limit = optional(args, 2, "limit")?;
            print_json(&client.device_telemetry(id, limit).map_err(api_err("device telemetry"))?)
        }
        "latest" => match optional::<i64>(args, 1, "device id")? {
            Some(id) => print_json(
                &client
                    .device_latest_telemetry(DeviceId(id))
                    .map_err(api_err("latest telemetry"))?,
            ),
            None => print_json(&client.latest_telemetry().map_err(api_err("latest telemetry"))?),
        },
        "summary" => {
            let id = device_arg(args, 1)?;
            let period: SummaryPeriod = optional(args, 2, "period")?.unwrap_or_default();
            print_json(&client.telemetry_summary(id, period).map_err(api_err("telemetry summary"))?)
        }
        "add" => {
            let reading = NewTelemetry {
                device_id: device_arg(args, 1)?,
                power: parse(arg(args, 2, "power")?, "power")?,
                voltage: optional(args, 3, "voltage")?,
                current: optional(args, 4, "current")?,
            };
            print_json(&client.create_telemetry(&reading).map_err(api_err("create telemetry"))?)
        }
        "delete" => {
            let id = TelemetryId(parse(arg(args, 1, "telemetry id")?, "telemetry id")?);
            client.delete_telemetry(id).map_err(api_err("delete telemetry"))
        }
        other => Err(format!("unknown telemetry subcommand: {}", other)),
    }
}

fn run_simulate(app: &App, args: &[String]) -> Result<(), String> {
    let client = &app.client;
    match arg(args, 0, "simulate subcommand")? {
        "one" => {
            let id = device_arg(args, 1)?;
            let config = SimulatorConfig {
                base_power: optional(args, 2, "base power")?,
                ..Default::default()
            };
            let reading = client
                .simulate_telemetry(id, Some(&config))
                .map_err(api_err("simulate"))?;
            print_json(&reading)
        }
        "bulk" => {
            let id = device_arg(args, 1)?;
            let config = SimulatorConfig {
                count: optional(args, 2, "count")?,
                ..Default::default()
            };
            let effective = config.resolved_bulk();
            info!(
                "Requesting {} simulated reading(s) for device {} every {}s",
                effective.count, id, effective.interval_sec
            );
            let result = client
                .simulate_bulk_telemetry(id, Some(&config))
                .map_err(api_err("bulk simulate"))?;
            print_json(&result)
        }
        other => Err(format!("unknown simulate subcommand: {}", other)),
    }
}

fn run_sim_mode(app: &App, args: &[String]) -> Result<(), String> {
    let modes = &app.simulation;
    match arg(args, 0, "sim-mode subcommand")? {
        "list" => print_json(&modes.all()),
        "get" => print_json(&modes.get(device_arg(args, 1)?)),
        "set" => {
            let id = device_arg(args, 1)?;
            let enabled = match arg(args, 2, "on|off")? {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                other => return Err(format!("expected on or off, got {}", other)),
            };
            modes.set(id, enabled);
            print_json(&enabled)
        }
        "toggle" => print_json(&modes.toggle(device_arg(args, 1)?)),
        other => Err(format!("unknown sim-mode subcommand: {}", other)),
    }
}

fn run_thresholds(app: &App, args: &[String]) -> Result<(), String> {
    let thresholds = &app.thresholds;
    match arg(args, 0, "thresholds subcommand")? {
        "list" => print_json(&thresholds.all()),
        "get" => print_json(&thresholds.get(device_arg(args, 1)?)),
        "set" => {
            let id = device_arg(args, 1)?;
            let t = DeviceThresholds::new(
                parse(arg(args, 2, "warning")?, "warning")?,
                parse(arg(args, 3, "danger")?, "danger")?,
            )?;
            thresholds.set(id, t)?;
            print_json(&t)
        }
        "remove" => {
            thresholds.remove(device_arg(args, 1)?);
            Ok(())
        }
        "check" => {
            let id = device_arg(args, 1)?;
            let power: f64 = parse(arg(args, 2, "power")?, "power")?;
            match thresholds.get(id) {
                Some(t) => print_json(&t.classify(power)),
                None => Err(format!("no thresholds configured for device {}", id)),
            }
        }
        other => Err(format!("unknown thresholds subcommand: {}", other)),
    }
}

fn main() {
    let (loaded_env, args) = match dotenv::split_env_flag(std::env::args_os().skip(1))
        .and_then(|(file, args)| Ok((dotenv::load_for_cli(file)?, args)))
    {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG may come from the env file, so the logger starts second.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(source) = &loaded_env {
        let kind = if source.explicit { ENV_FILE_FLAG } else { "working directory" };
        debug!("Read variables from {} ({})", source.path.display(), kind);
    }

    debug!(
        "energyctl {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(&args) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
