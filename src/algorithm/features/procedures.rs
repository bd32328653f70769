//! Procedure flags and urine output over the observation window

use crate::algorithm::context::StayContext;
use crate::codes::Concept;

/// Procedures running at any point inside the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcedureFlags {
    pub mechanical_ventilation: bool,
    pub renal_replacement_therapy: bool,
}

impl ProcedureFlags {
    #[must_use]
    pub fn collect(ctx: &StayContext<'_>) -> Self {
        Self {
            mechanical_ventilation: any_procedure(ctx, &[Concept::InvasiveVentilation]),
            renal_replacement_therapy: any_procedure(ctx, &[Concept::RenalReplacement]),
        }
    }
}

fn any_procedure(ctx: &StayContext<'_>, concepts: &[Concept]) -> bool {
    let itemids = ctx.codes.codes_of(concepts);
    !ctx.store
        .procedures(ctx.stay.stay_id, &itemids, &ctx.window)
        .is_empty()
}

/// Urine volume over the window in mL, net of GU irrigant; `None` without urine rows
#[must_use]
pub fn urine_output(ctx: &StayContext<'_>) -> Option<f64> {
    let readings = ctx.output_readings(&[Concept::UrineOutput, Concept::GuIrrigantIn]);
    let mut urine = None;
    let mut irrigant = 0.0;
    for reading in readings {
        match reading.concept {
            Concept::GuIrrigantIn => irrigant += reading.value,
            _ => *urine.get_or_insert(0.0) += reading.value,
        }
    }
    urine.map(|total: f64| total - irrigant)
}
