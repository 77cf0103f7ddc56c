use cartgrid::params::{FoldedFieldParams, GridXyGeom, ZLevels};
use cartgrid::synthetic::SyntheticVolumeBuilder;
use cartgrid::{
    CartInterpBuilder, ConvStratClassifier, ConvStratGrid, InterpParamsBuilder, RadarSite,
};
use clap::Parser;
use log::info;
use ndarray::ArrayView3;
use pretty_env_logger;
use std::error::Error;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    author,
    about = "Interpolate a synthetic radar volume onto a Cartesian grid",
    long_about = None,
    version = env!("CARTGRID_VERSION")
)]
struct Cli {
    /// Number of grid cells in x and y
    #[clap(short, long, default_value = "101")]
    n_xy: usize,

    /// Grid spacing in km
    #[clap(short, long, default_value = "1.0")]
    dxy: f64,

    /// Height levels in km (space-separated)
    #[clap(short, long, value_delimiter = ' ', num_args = 1.., default_values_t = [0.5, 1.0, 2.0, 3.0, 4.0])]
    z_levels: Vec<f64>,

    /// Elevation angles of the synthetic sweeps (space-separated)
    #[clap(short, long, value_delimiter = ' ', num_args = 1.., default_values_t = [0.5, 1.5, 2.5, 3.5, 4.5, 6.0])]
    elevations: Vec<f64>,

    /// First azimuth of each sweep
    #[clap(long, default_value = "0.0")]
    az_start: f64,

    /// Number of rays per sweep, one degree apart
    #[clap(long, default_value = "360")]
    n_az: usize,

    /// Number of compute threads, 1 disables multithreading
    #[clap(short, long, default_value = "4")]
    threads: usize,

    /// Use nearest neighbour for every field
    #[clap(long, action)]
    nearest: bool,

    /// Emit per-cell debug fields
    #[clap(long, action)]
    debug_fields: bool,

    /// Run a reflectivity threshold partition on DBZ (dBZ)
    #[clap(long)]
    conv_threshold: Option<f32>,
}

struct ThresholdPartition {
    threshold: f32,
}

impl ConvStratClassifier for ThresholdPartition {
    fn compute_partition(
        &mut self,
        dbz: ArrayView3<'_, f32>,
        missing: f32,
        grid: &ConvStratGrid<'_>,
    ) -> anyhow::Result<()> {
        let valid = dbz.iter().filter(|&&val| val != missing).count();
        if valid == 0 {
            anyhow::bail!("no valid reflectivity on the {} x {} grid", grid.nx, grid.ny);
        }
        let above = dbz
            .iter()
            .filter(|&&val| val != missing && val >= self.threshold)
            .count();
        info!(
            "{} of {} valid cells at or above {} dBZ",
            above, valid, self.threshold
        );
        Ok(())
    }
}

fn entrypoint() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    pretty_env_logger::init();

    let site = RadarSite {
        latitude_deg: 40.0,
        longitude_deg: -105.0,
        altitude_km: 0.3,
        ..Default::default()
    };
    let volume = SyntheticVolumeBuilder::default()
        .site(&site)
        .elevations(&cli.elevations)
        .azimuths(cli.az_start, 1.0, cli.n_az)
        .gates(0.25, 0.25, 600)
        .nyquist(25.0)
        .field("DBZ", |az, el, range| {
            (45.0 - 0.25 * range - 2.0 * el + 10.0 * az.to_radians().sin()) as f32
        })
        .field("VEL", |az, _, range| {
            (30.0 * az.to_radians().cos() + 0.1 * range).rem_euclid(50.0) as f32 - 25.0
        })
        .field("HCA", |az, el, _| ((az as i64 / 30 + el as i64) % 6) as f32)
        .build()?;

    let half_width = (cli.n_xy as f64 - 1.0) * cli.dxy / 2.0;
    let mut builder = InterpParamsBuilder::default();
    builder
        .grid_xy(GridXyGeom {
            nx: cli.n_xy,
            ny: cli.n_xy,
            minx: -half_width,
            miny: -half_width,
            dx: cli.dxy,
            dy: cli.dxy,
        })
        .z_levels(ZLevels::Explicit(cli.z_levels.clone()))
        .use_multiple_threads(cli.threads > 1)
        .n_compute_threads(cli.threads)
        .use_nearest_neighbor(cli.nearest)
        .output_debug_fields(cli.debug_fields)
        .discrete_fields(vec!["HCA".to_string()])
        .folded_fields(vec![FoldedFieldParams {
            name: "VEL".to_string(),
            limits: None,
        }]);
    if cli.conv_threshold.is_some() {
        builder.conv_strat_field_name("DBZ");
    }
    let params = builder.build()?;

    let mut interp_builder = CartInterpBuilder::default();
    interp_builder.params(&params);
    if let Some(threshold) = cli.conv_threshold {
        interp_builder.classifier(Box::new(ThresholdPartition { threshold }));
    }
    let mut interp = interp_builder.build()?;
    let grid_vol = interp.interp_vol(&volume, &[])?;

    for field in grid_vol.fields.iter().chain(grid_vol.debug_fields.iter()) {
        let coverage = 100.0 * field.n_valid() as f64 / field.data.len() as f64;
        match field.valid_range() {
            Some((min, max)) => info!(
                "{:>10}: {:5.1}% valid, min {:8.3}, max {:8.3}",
                field.name, coverage, min, max
            ),
            None => info!("{:>10}: no valid cells", field.name),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match entrypoint() {
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}
