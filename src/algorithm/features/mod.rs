//! Per-stay feature aggregation

pub mod anthropometry;
pub mod infusions;
pub mod labs;
pub mod procedures;
pub mod ratios;
pub mod vitals;

use crate::algorithm::context::StayContext;
use crate::codes::Concept;

pub use anthropometry::Anthropometry;
pub use infusions::VasopressorExposure;
pub use labs::LabPanel;
pub use procedures::{ProcedureFlags, urine_output};
pub use vitals::VitalSigns;

/// Every aggregated feature of one stay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StayFeatures {
    pub vitals: VitalSigns,
    pub labs: LabPanel,
    pub fio2_mean: Option<f64>,
    pub nlr: Option<f64>,
    pub pf_ratio: Option<f64>,
    pub urine_output: Option<f64>,
    pub vasopressors: VasopressorExposure,
    pub procedures: ProcedureFlags,
    pub anthropometry: Anthropometry,
}

impl StayFeatures {
    /// Aggregate every feature over the context's observation window
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        let labs = LabPanel::collect(ctx);
        let fio2_mean = ctx.chart_summary(&[Concept::FiO2]).map(|s| s.mean);

        Self {
            vitals: VitalSigns::collect(ctx),
            nlr: ratios::neutrophil_lymphocyte_ratio(
                labs.mean(Concept::Neutrophils),
                labs.mean(Concept::Lymphocytes),
            ),
            pf_ratio: ratios::pf_ratio(labs.mean(Concept::Pao2), fio2_mean),
            fio2_mean,
            labs,
            urine_output: urine_output(ctx),
            vasopressors: VasopressorExposure::collect(ctx),
            procedures: ProcedureFlags::collect(ctx),
            anthropometry: Anthropometry::collect(ctx),
        }
    }
}
