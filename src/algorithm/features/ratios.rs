//! Derived ratios
//!
//! Both ratios divide window averages (never average per-sample ratios) and
//! are missing rather than infinite when the denominator is zero.

/// Neutrophil-to-lymphocyte ratio of the window averages
#[must_use]
pub fn neutrophil_lymphocyte_ratio(neutrophils: Option<f64>, lymphocytes: Option<f64>) -> Option<f64> {
    let lymphocytes = lymphocytes?;
    if lymphocytes == 0.0 {
        return None;
    }
    Some(neutrophils? / lymphocytes)
}

/// PaO2/FiO2 ratio: `round(avg PaO2) / round(avg FiO2)`, FiO2 in percent
#[must_use]
pub fn pf_ratio(pao2_mean: Option<f64>, fio2_mean: Option<f64>) -> Option<f64> {
    let fio2 = fio2_mean?.round();
    if fio2 == 0.0 {
        return None;
    }
    Some(pao2_mean?.round() / fio2)
}
