//! Antibiotic vocabulary for suspicion-of-infection detection

use crate::models::Prescription;

/// Drug-name fragments identifying systemic antibiotics
const ANTIBIOTIC_TERMS: &[&str] = &[
    "adoxa", "ala-tet", "alodox", "amikacin", "amoxicillin", "ampicillin", "augmentin",
    "avelox", "avidoxy", "azactam", "azithromycin", "aztreonam", "bactrim", "bicillin",
    "cefadroxil", "cefazolin", "cefdinir", "cefepime", "cefotaxime", "cefotetan",
    "cefoxitin", "cefpodoxime", "cefprozil", "ceftaroline", "ceftazidime", "ceftriaxone",
    "cefuroxime", "cephalexin", "chloramphenicol", "cipro", "ciprofloxacin", "clarithromycin",
    "clindamycin", "cleocin", "colistin", "dapsone", "daptomycin", "doripenem", "doxycycline",
    "ertapenem", "erythromycin", "gentamicin", "imipenem", "keflex", "levofloxacin",
    "linezolid", "meropenem", "metronidazole", "minocycline", "moxifloxacin", "nafcillin",
    "nitrofurantoin", "norfloxacin", "oxacillin", "penicillin", "piperacillin", "polymyxin",
    "rifampin", "streptomycin", "sulfamethoxazole", "synercid", "tazobactam", "tetracycline",
    "tigecycline", "tobramycin", "trimethoprim", "unasyn", "vancomycin", "zithromax",
    "zosyn", "zyvox",
];

/// Topical, ophthalmic and otic routes
const EXCLUDED_ROUTES: &[&str] = &["OU", "OS", "OD", "AU", "AS", "AD", "TP"];

/// Formulations that are not systemic therapy
const EXCLUDED_FORMS: &[&str] = &["cream", "desensitization", "ophth oint", "gel", "ointment"];

/// Whether a prescription is a systemic antibiotic
#[must_use]
pub fn is_antibiotic(prescription: &Prescription) -> bool {
    let drug = prescription.drug.to_lowercase();
    if !ANTIBIOTIC_TERMS.iter().any(|term| drug.contains(term)) {
        return false;
    }
    if EXCLUDED_FORMS.iter().any(|form| drug.contains(form)) {
        return false;
    }
    match prescription.route.as_deref() {
        Some(route) => !EXCLUDED_ROUTES
            .iter()
            .any(|excluded| route.trim().eq_ignore_ascii_case(excluded)),
        None => true,
    }
}
