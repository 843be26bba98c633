//! Energy history handler.

use neviweb_api::{EnergyBucket, StatsPeriod};
use neviweb_core::Controller;
use tabled::Tabled;

use crate::cli::{GlobalOpts, PeriodArg, StatsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Energy (Wh)")]
    energy: String,
}

impl From<&EnergyBucket> for BucketRow {
    fn from(b: &EnergyBucket) -> Self {
        Self {
            date: b.date.clone().unwrap_or_else(|| "-".into()),
            energy: b.energy.map_or_else(|| "-".into(), |wh| format!("{wh:.1}")),
        }
    }
}

impl From<PeriodArg> for StatsPeriod {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Hourly => Self::Hourly,
            PeriodArg::Daily => Self::Daily,
            PeriodArg::Monthly => Self::Monthly,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: StatsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let snap = util::resolve_device(controller, &args.device)?;
    let period = StatsPeriod::from(args.period);

    let Some(buckets) = controller.device_stats(snap.device.id, period).await? else {
        if !global.quiet {
            eprintln!("No {period} history for '{}'", snap.device.name);
        }
        return Ok(());
    };

    let out = output::render_list(&global.output, &buckets, |b| BucketRow::from(b), |b| {
        b.energy.map(|wh| wh.to_string()).unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
