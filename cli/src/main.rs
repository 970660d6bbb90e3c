// atmodem -- CLI tool for configuring and querying a cellular modem over
// its serial AT command interface.
//
// Usage:
//   atmodem --device /dev/ttyUSB2 --imsi
//   atmodem --device /dev/ttyUSB2 --imei --iccid --firmware
//   atmodem --device /dev/ttyUSB2 --gps
//   atmodem --device /dev/ttyUSB2 --no-gps
//   atmodem --device /dev/ttyUSB2 --nv-read ims/ims_enabled
//   atmodem --device /dev/ttyUSB2 --nv-write ims/ims_enabled 01
//
// Multiple action flags can be combined in one invocation; they run in a
// fixed order against a single open device. Exit status is 0 only when
// every requested operation succeeded.

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use atmodem_at::{GpsState, Modem};
use atmodem_transport::SerialTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Configure and query a cellular modem over its AT command interface.
#[derive(Parser)]
#[command(name = "atmodem", version, about)]
struct Cli {
    /// Path to the modem's AT command device (e.g. /dev/ttyUSB2).
    #[arg(long)]
    device: String,

    /// Baud rate for the AT command port.
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Start the GNSS engine (no-op if already running).
    #[arg(long)]
    gps: bool,

    /// Stop the GNSS engine (no-op if already stopped).
    #[arg(long)]
    no_gps: bool,

    /// Read a non-volatile configuration item by name.
    #[arg(long, value_name = "ITEM")]
    nv_read: Option<String>,

    /// Write a non-volatile configuration item.
    #[arg(long, num_args = 2, value_names = ["ITEM", "VALUE"])]
    nv_write: Option<Vec<String>>,

    /// Read the SIM IMSI.
    #[arg(long)]
    imsi: bool,

    /// Read the modem IMEI.
    #[arg(long)]
    imei: bool,

    /// Read the SIM ICCID.
    #[arg(long)]
    iccid: bool,

    /// Read the modem firmware version.
    #[arg(long)]
    firmware: bool,
}

impl Cli {
    /// Whether any action flag was given.
    fn has_action(&self) -> bool {
        self.gps
            || self.no_gps
            || self.nv_read.is_some()
            || self.nv_write.is_some()
            || self.imsi
            || self.imei
            || self.iccid
            || self.firmware
    }
}

/// Validate flag combinations before any I/O is attempted.
fn validate(cli: &Cli) -> Result<()> {
    if cli.gps && cli.no_gps {
        bail!("invalid argument: --gps and --no-gps are mutually exclusive");
    }
    if !cli.has_action() {
        bail!(
            "invalid argument: no action provided (use --gps, --no-gps, --nv-read, \
             --nv-write, --imsi, --imei, --iccid, or --firmware)"
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Run every requested action against the open modem, in a fixed order.
async fn run_actions(cli: &Cli, modem: &mut Modem) -> Result<()> {
    if cli.gps || cli.no_gps {
        // Start/stop are only accepted from the opposite state, so read
        // the state first and skip the command when nothing would change.
        let state = modem.gps_state().await?;
        println!("gnss state: {state}");

        if cli.gps && state == GpsState::Off {
            println!("gnss: starting");
            modem.start_gps().await?;
        }
        if cli.no_gps && state == GpsState::On {
            println!("gnss: stopping");
            modem.stop_gps().await?;
        }
    }

    if let Some(item) = &cli.nv_read {
        let value = modem
            .nv_read(item)
            .await
            .with_context(|| format!("failed to read non-volatile item {item:?}"))?;
        println!("{value}");
    }

    if let Some(pair) = &cli.nv_write {
        let (item, value) = (&pair[0], &pair[1]);
        modem
            .nv_write(item, value)
            .await
            .with_context(|| format!("failed to write non-volatile item {item:?}"))?;
    }

    if cli.imsi {
        println!("{}", modem.imsi().await.context("failed to read IMSI")?);
    }

    if cli.imei {
        println!("{}", modem.imei().await.context("failed to read IMEI")?);
    }

    if cli.iccid {
        println!("{}", modem.iccid().await.context("failed to read ICCID")?);
    }

    if cli.firmware {
        println!(
            "{}",
            modem
                .firmware_version()
                .await
                .context("failed to read firmware version")?
        );
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    validate(&cli)?;

    let transport = SerialTransport::open(&cli.device, cli.baud)
        .await
        .with_context(|| format!("failed to open modem device {}", cli.device))?;
    let mut modem = Modem::new(Box::new(transport));

    // Make sure the modem responds to AT at all, then run the actions.
    // The device is closed on every path, success or failure.
    let result = async {
        modem
            .probe()
            .await
            .context("modem did not respond to AT probe")?;
        run_actions(&cli, &mut modem).await
    }
    .await;

    modem.close().await.ok();
    result
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        println!("{e:#}");
        std::process::exit(1);
    }
}
