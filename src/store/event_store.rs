//! In-memory, indexed event store
//!
//! Every event table is bucketed by its access key (stay, subject or
//! admission) and each bucket is kept sorted by time, so a windowed query is
//! two binary searches plus a filter on item code.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::models::{
    Admission, ChartEvent, DiagnosisCode, HadmId, IcuStay, InputEvent, ItemId, LabEvent,
    Measurement, MicrobiologyCulture, OutputEvent, Patient, Prescription, ProcedureEvent,
    ServiceTransfer, StayId, SubjectId, Timed,
};
use crate::store::TimeWindow;

/// Read-only access to the clinical event tables
///
/// Windowed queries return only rows whose item code is in `itemids`, whose
/// time falls inside the window and whose numeric value is present; interval
/// events (infusions, procedures) are returned when they overlap the window.
pub trait EventSource: Sync {
    /// All ICU stays ordered by (`subject_id`, `intime`, `stay_id`)
    fn stays(&self) -> &[IcuStay];

    fn stay(&self, stay_id: StayId) -> Option<&IcuStay>;

    fn patient(&self, subject_id: SubjectId) -> Option<&Patient>;

    fn admission(&self, hadm_id: HadmId) -> Option<&Admission>;

    fn chart_measurements(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement>;

    /// Labs are keyed by subject since many draws carry no admission link
    fn lab_measurements(
        &self,
        subject_id: SubjectId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement>;

    fn output_measurements(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement>;

    fn infusions(&self, stay_id: StayId, itemids: &[ItemId], window: &TimeWindow)
    -> Vec<&InputEvent>;

    fn procedures(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<&ProcedureEvent>;

    /// Every diagnosis of a subject, across all admissions
    fn diagnoses(&self, subject_id: SubjectId) -> &[DiagnosisCode];

    /// Prescriptions of a subject ordered by start time
    fn prescriptions(&self, subject_id: SubjectId) -> &[Prescription];

    /// Microbiology cultures of a subject ordered by time
    fn cultures(&self, subject_id: SubjectId) -> &[MicrobiologyCulture];

    /// Service transfers of an admission ordered by transfer time
    fn services(&self, hadm_id: HadmId) -> &[ServiceTransfer];
}

/// Row counts per table, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub patients: usize,
    pub admissions: usize,
    pub stays: usize,
    pub chart_events: usize,
    pub lab_events: usize,
    pub output_events: usize,
    pub input_events: usize,
    pub procedure_events: usize,
    pub diagnoses: usize,
    pub prescriptions: usize,
    pub cultures: usize,
    pub services: usize,
}

impl fmt::Display for StoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} patients, {} admissions, {} stays, {} chart, {} lab, {} output, {} input, {} procedure events",
            self.patients,
            self.admissions,
            self.stays,
            self.chart_events,
            self.lab_events,
            self.output_events,
            self.input_events,
            self.procedure_events
        )
    }
}

/// Event store backed by hash-indexed, time-sorted vectors
#[derive(Debug, Default)]
pub struct EventStore {
    stays: Vec<IcuStay>,
    stay_index: FxHashMap<StayId, usize>,
    patients: FxHashMap<SubjectId, Patient>,
    admissions: FxHashMap<HadmId, Admission>,
    chart: FxHashMap<StayId, Vec<ChartEvent>>,
    labs: FxHashMap<SubjectId, Vec<LabEvent>>,
    outputs: FxHashMap<StayId, Vec<OutputEvent>>,
    inputs: FxHashMap<StayId, Vec<InputEvent>>,
    procedures: FxHashMap<StayId, Vec<ProcedureEvent>>,
    diagnoses: FxHashMap<SubjectId, Vec<DiagnosisCode>>,
    prescriptions: FxHashMap<SubjectId, Vec<Prescription>>,
    cultures: FxHashMap<SubjectId, Vec<MicrobiologyCulture>>,
    services: FxHashMap<HadmId, Vec<ServiceTransfer>>,
    summary: StoreSummary,
}

impl EventStore {
    /// Start building a store from individual records
    #[must_use]
    pub fn builder() -> EventStoreBuilder {
        EventStoreBuilder::default()
    }

    #[must_use]
    pub const fn summary(&self) -> StoreSummary {
        self.summary
    }
}

/// Events of a time-sorted bucket falling inside the window
fn window_slice<'a, T: Timed>(events: &'a [T], window: &TimeWindow) -> &'a [T] {
    let lo = events.partition_point(|event| event.time() < window.start);
    let hi = events.partition_point(|event| event.time() <= window.end);
    &events[lo..hi.max(lo)]
}

/// Events of a start-sorted bucket that may overlap the window
fn started_before<'a, T: Timed>(events: &'a [T], window: &TimeWindow) -> &'a [T] {
    let hi = events.partition_point(|event| event.time() <= window.end);
    &events[..hi]
}

fn bucket<'a, K: std::hash::Hash + Eq, T>(map: &'a FxHashMap<K, Vec<T>>, key: &K) -> &'a [T] {
    map.get(key).map_or(&[][..], Vec::as_slice)
}

impl EventSource for EventStore {
    fn stays(&self) -> &[IcuStay] {
        &self.stays
    }

    fn stay(&self, stay_id: StayId) -> Option<&IcuStay> {
        self.stay_index.get(&stay_id).map(|&idx| &self.stays[idx])
    }

    fn patient(&self, subject_id: SubjectId) -> Option<&Patient> {
        self.patients.get(&subject_id)
    }

    fn admission(&self, hadm_id: HadmId) -> Option<&Admission> {
        self.admissions.get(&hadm_id)
    }

    fn chart_measurements(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement> {
        window_slice(bucket(&self.chart, &stay_id), window)
            .iter()
            .filter(|event| itemids.contains(&event.itemid))
            .filter_map(|event| {
                event.valuenum.map(|value| Measurement {
                    time: event.charttime,
                    itemid: event.itemid,
                    value,
                })
            })
            .collect()
    }

    fn lab_measurements(
        &self,
        subject_id: SubjectId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement> {
        window_slice(bucket(&self.labs, &subject_id), window)
            .iter()
            .filter(|event| itemids.contains(&event.itemid))
            .filter_map(|event| {
                event.valuenum.map(|value| Measurement {
                    time: event.charttime,
                    itemid: event.itemid,
                    value,
                })
            })
            .collect()
    }

    fn output_measurements(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<Measurement> {
        window_slice(bucket(&self.outputs, &stay_id), window)
            .iter()
            .filter(|event| itemids.contains(&event.itemid))
            .filter_map(|event| {
                event.value.map(|value| Measurement {
                    time: event.charttime,
                    itemid: event.itemid,
                    value,
                })
            })
            .collect()
    }

    fn infusions(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<&InputEvent> {
        started_before(bucket(&self.inputs, &stay_id), window)
            .iter()
            .filter(|event| itemids.contains(&event.itemid) && event.overlaps(window))
            .collect()
    }

    fn procedures(
        &self,
        stay_id: StayId,
        itemids: &[ItemId],
        window: &TimeWindow,
    ) -> Vec<&ProcedureEvent> {
        started_before(bucket(&self.procedures, &stay_id), window)
            .iter()
            .filter(|event| itemids.contains(&event.itemid) && event.overlaps(window))
            .collect()
    }

    fn diagnoses(&self, subject_id: SubjectId) -> &[DiagnosisCode] {
        bucket(&self.diagnoses, &subject_id)
    }

    fn prescriptions(&self, subject_id: SubjectId) -> &[Prescription] {
        bucket(&self.prescriptions, &subject_id)
    }

    fn cultures(&self, subject_id: SubjectId) -> &[MicrobiologyCulture] {
        bucket(&self.cultures, &subject_id)
    }

    fn services(&self, hadm_id: HadmId) -> &[ServiceTransfer] {
        bucket(&self.services, &hadm_id)
    }
}

/// Collects records and produces an indexed [`EventStore`]
///
/// Records may be added in any order; `build` sorts every bucket. A stay or
/// patient added twice keeps the last copy.
#[derive(Debug, Default)]
pub struct EventStoreBuilder {
    store: EventStore,
}

impl EventStoreBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patient(&mut self, patient: Patient) -> &mut Self {
        self.store.patients.insert(patient.subject_id, patient);
        self
    }

    pub fn add_admission(&mut self, admission: Admission) -> &mut Self {
        self.store.admissions.insert(admission.hadm_id, admission);
        self
    }

    pub fn add_stay(&mut self, stay: IcuStay) -> &mut Self {
        self.store.stays.push(stay);
        self
    }

    pub fn add_chart_event(&mut self, event: ChartEvent) -> &mut Self {
        self.store.chart.entry(event.stay_id).or_default().push(event);
        self
    }

    pub fn add_lab_event(&mut self, event: LabEvent) -> &mut Self {
        self.store.labs.entry(event.subject_id).or_default().push(event);
        self
    }

    pub fn add_output_event(&mut self, event: OutputEvent) -> &mut Self {
        self.store.outputs.entry(event.stay_id).or_default().push(event);
        self
    }

    pub fn add_input_event(&mut self, event: InputEvent) -> &mut Self {
        self.store.inputs.entry(event.stay_id).or_default().push(event);
        self
    }

    pub fn add_procedure_event(&mut self, event: ProcedureEvent) -> &mut Self {
        self.store
            .procedures
            .entry(event.stay_id)
            .or_default()
            .push(event);
        self
    }

    pub fn add_diagnosis(&mut self, diagnosis: DiagnosisCode) -> &mut Self {
        self.store
            .diagnoses
            .entry(diagnosis.subject_id)
            .or_default()
            .push(diagnosis);
        self
    }

    pub fn add_prescription(&mut self, prescription: Prescription) -> &mut Self {
        self.store
            .prescriptions
            .entry(prescription.subject_id)
            .or_default()
            .push(prescription);
        self
    }

    pub fn add_culture(&mut self, culture: MicrobiologyCulture) -> &mut Self {
        self.store
            .cultures
            .entry(culture.subject_id)
            .or_default()
            .push(culture);
        self
    }

    pub fn add_service(&mut self, service: ServiceTransfer) -> &mut Self {
        self.store
            .services
            .entry(service.hadm_id)
            .or_default()
            .push(service);
        self
    }

    /// Extend with many records of one kind
    pub fn extend<T>(&mut self, records: impl IntoIterator<Item = T>) -> &mut Self
    where
        Self: AddRecord<T>,
    {
        for record in records {
            self.add_record(record);
        }
        self
    }

    /// Sort every bucket and index the stays
    #[must_use]
    pub fn build(self) -> EventStore {
        let mut store = self.store;

        let latest: FxHashMap<StayId, IcuStay> = std::mem::take(&mut store.stays)
            .into_iter()
            .map(|stay| (stay.stay_id, stay))
            .collect();
        store.stays = latest.into_values().collect();
        store
            .stays
            .sort_by_key(|stay| (stay.subject_id, stay.intime, stay.stay_id));
        store.stay_index = store
            .stays
            .iter()
            .enumerate()
            .map(|(idx, stay)| (stay.stay_id, idx))
            .collect();

        sort_buckets(&mut store.chart);
        sort_buckets(&mut store.labs);
        sort_buckets(&mut store.outputs);
        sort_buckets(&mut store.inputs);
        sort_buckets(&mut store.procedures);
        sort_buckets(&mut store.prescriptions);
        sort_buckets(&mut store.cultures);
        sort_buckets(&mut store.services);
        for codes in store.diagnoses.values_mut() {
            codes.sort_by_key(|code| (code.hadm_id, code.seq_num));
        }

        store.summary = StoreSummary {
            patients: store.patients.len(),
            admissions: store.admissions.len(),
            stays: store.stays.len(),
            chart_events: count(&store.chart),
            lab_events: count(&store.labs),
            output_events: count(&store.outputs),
            input_events: count(&store.inputs),
            procedure_events: count(&store.procedures),
            diagnoses: count(&store.diagnoses),
            prescriptions: count(&store.prescriptions),
            cultures: count(&store.cultures),
            services: count(&store.services),
        };
        store
    }
}

/// Dispatch for [`EventStoreBuilder::extend`]
pub trait AddRecord<T> {
    fn add_record(&mut self, record: T);
}

macro_rules! impl_add_record {
    ($($record:ty => $method:ident),* $(,)?) => {
        $(
            impl AddRecord<$record> for EventStoreBuilder {
                fn add_record(&mut self, record: $record) {
                    self.$method(record);
                }
            }
        )*
    };
}

impl_add_record!(
    Patient => add_patient,
    Admission => add_admission,
    IcuStay => add_stay,
    ChartEvent => add_chart_event,
    LabEvent => add_lab_event,
    OutputEvent => add_output_event,
    InputEvent => add_input_event,
    ProcedureEvent => add_procedure_event,
    DiagnosisCode => add_diagnosis,
    Prescription => add_prescription,
    MicrobiologyCulture => add_culture,
    ServiceTransfer => add_service,
);

fn sort_buckets<K, T: Timed>(map: &mut FxHashMap<K, Vec<T>>) {
    for events in map.values_mut() {
        events.sort_by_key(Timed::time);
    }
}

fn count<K, T>(map: &FxHashMap<K, Vec<T>>) -> usize {
    map.values().map(Vec::len).sum()
}
