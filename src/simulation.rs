//! Minute-by-minute simulation of an emergency department that produces the wait time dataset.
//!
//! Patients arrive at random, first wait for triage by a nurse and then for treatment by a doctor.
//! Both queues are served by priority, earliest arrival first.  The recorded wait is the time
//! between arrival and the start of triage.  A staff member is free once their current patient is
//! done; on top of that each free member is only on the floor with a configurable probability per
//! minute.

use std::cmp::Reverse;
use std::ops::{Range, RangeInclusive};

use log::{debug, info};
use rand::prelude::*;

use crate::dataset::{PatientRecord, Priority};

/// Parameters of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    minutes: u32,
    doctors: usize,
    nurses: usize,
    seed: Option<u64>,
    report_interval: u32,
    base_arrivals_per_hour: f64,
    peak_arrivals_per_hour: f64,
    peak_hours: Range<u32>,
    triage_minutes: RangeInclusive<u32>,
    treatment_minutes: RangeInclusive<u32>,
    availability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            minutes: 1000,
            doctors: 3,
            nurses: 5,
            seed: None,
            report_interval: 100,
            base_arrivals_per_hour: 10.0,
            peak_arrivals_per_hour: 20.0,
            peak_hours: 16..22,
            triage_minutes: 5..=15,
            treatment_minutes: 10..=30,
            availability: 0.5,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn doctors(&self) -> usize {
        self.doctors
    }

    pub fn nurses(&self) -> usize {
        self.nurses
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Sets the simulated duration in minutes.
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = minutes;
        self
    }

    pub fn with_doctors(mut self, doctors: usize) -> Self {
        self.doctors = doctors;
        self
    }

    pub fn with_nurses(mut self, nurses: usize) -> Self {
        self.nurses = nurses;
        self
    }

    /// Fixes the random seed; without one the generator is seeded from the OS.
    pub fn with_seed(mut self, seed: impl Into<Option<u64>>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Interval between status reports; `0` disables them.
    pub fn with_report_interval(mut self, minutes: u32) -> Self {
        self.report_interval = minutes;
        self
    }

    /// Arrival rates in patients per hour outside and inside the peak hours.
    ///
    /// Negative and `NaN` rates mean no arrivals.
    pub fn with_arrival_rates(mut self, base: f64, peak: f64) -> Self {
        self.base_arrivals_per_hour = non_negative(base);
        self.peak_arrivals_per_hour = non_negative(peak);
        self
    }

    /// Hours of the day (0-23, end exclusive) using the peak arrival rate.
    pub fn with_peak_hours(mut self, hours: Range<u32>) -> Self {
        self.peak_hours = hours;
        self
    }

    /// Probability that a free staff member takes a patient in a given minute.
    ///
    /// Clamped to `0..=1`; `NaN` counts as never available.
    pub fn with_availability(mut self, availability: f64) -> Self {
        self.availability = probability(availability);
        self
    }

    fn arrival_probability(&self, minute: u32) -> f64 {
        let hour = (minute / 60) % 24;
        let rate = if self.peak_hours.contains(&hour) {
            self.peak_arrivals_per_hour
        } else {
            self.base_arrivals_per_hour
        };
        probability(rate / 60.0)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Clamps `value` into a probability that `Rng::random_bool` accepts.
fn probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug)]
struct Patient {
    id: u64,
    priority: Priority,
    arrival: u32,
    triage_minutes: u32,
    treatment_minutes: u32,
    ready_at: u32,
}

impl Patient {
    fn queue_key(&self) -> (Reverse<u8>, u32, u64) {
        (Reverse(urgency(self.priority)), self.arrival, self.id)
    }
}

fn urgency(priority: Priority) -> u8 {
    match priority {
        Priority::High => 3,
        Priority::Medium => 2,
        Priority::Low => 1,
    }
}

/// Draws a priority with a 50/30/20 High/Medium/Low split.
fn random_priority(rng: &mut impl Rng) -> Priority {
    match rng.random_range(0..100) {
        0..=49 => Priority::High,
        50..=79 => Priority::Medium,
        _ => Priority::Low,
    }
}

#[derive(Clone, Debug, Default)]
struct Staff {
    busy_until: u32,
    busy_minutes: u32,
}

impl Staff {
    fn is_free(&self, minute: u32) -> bool {
        self.busy_until <= minute
    }

    fn assign(&mut self, minute: u32, duration: u32) {
        self.busy_until = minute + duration;
        self.busy_minutes += duration;
    }
}

/// Removes the most urgent patient that is ready at `minute`.
fn take_next(queue: &mut Vec<Patient>, minute: u32) -> Option<Patient> {
    let index = queue
        .iter()
        .enumerate()
        .filter(|(_, patient)| patient.ready_at <= minute)
        .min_by_key(|(_, patient)| patient.queue_key())
        .map(|(index, _)| index)?;
    Some(queue.remove(index))
}

/// Result of a simulation run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationOutcome {
    /// One record per triaged patient, grouped High, Medium, Low in triage order.
    pub records: Vec<PatientRecord>,
    pub arrivals: u64,
    pub triaged: u64,
    pub treated: u64,
    pub waiting_for_triage: usize,
    pub waiting_for_treatment: usize,
    pub nurse_busy_minutes: u32,
    pub doctor_busy_minutes: u32,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Discrete-time emergency department model.
pub struct Simulation {
    config: SimulationConfig,
    rng: StdRng,
    nurses: Vec<Staff>,
    doctors: Vec<Staff>,
    triage_queue: Vec<Patient>,
    treatment_queue: Vec<Patient>,
    waits: [Vec<f64>; 3],
    next_id: u64,
    treated: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            nurses: vec![Staff::default(); config.nurses],
            doctors: vec![Staff::default(); config.doctors],
            config,
            rng,
            triage_queue: Vec::new(),
            treatment_queue: Vec::new(),
            waits: Default::default(),
            next_id: 0,
            treated: 0,
        }
    }

    /// Runs the configured number of minutes and returns the collected waits.
    pub fn run(mut self) -> SimulationOutcome {
        info!(
            "Simulating {} minutes with {} doctors and {} nurses",
            self.config.minutes, self.config.doctors, self.config.nurses
        );
        for minute in 0..self.config.minutes {
            self.step(minute);
            let interval = self.config.report_interval;
            if interval > 0 && minute % interval == 0 {
                self.report_status(minute);
            }
        }
        self.finish()
    }

    fn step(&mut self, minute: u32) {
        let arrival = self.config.arrival_probability(minute);
        if self.rng.random_bool(arrival) {
            let triage = self.config.triage_minutes.clone();
            let treatment = self.config.treatment_minutes.clone();
            let patient = Patient {
                id: self.next_id,
                priority: random_priority(&mut self.rng),
                arrival: minute,
                triage_minutes: self.rng.random_range(triage),
                treatment_minutes: self.rng.random_range(treatment),
                ready_at: minute,
            };
            self.next_id += 1;
            self.triage_queue.push(patient);
        }

        self.assign_nurses(minute);
        self.assign_doctors(minute);
    }

    fn on_floor(&mut self, staff: &Staff, minute: u32) -> bool {
        staff.is_free(minute) && self.rng.random_bool(self.config.availability)
    }

    fn assign_nurses(&mut self, minute: u32) {
        for index in 0..self.nurses.len() {
            let nurse = self.nurses[index].clone();
            if !self.on_floor(&nurse, minute) {
                continue;
            }
            let Some(mut patient) = take_next(&mut self.triage_queue, minute) else {
                break;
            };

            let wait = minute - patient.arrival;
            self.waits[patient_slot(patient.priority)].push(f64::from(wait));
            self.nurses[index].assign(minute, patient.triage_minutes);
            debug!(
                "Nurse {} triages patient {} ({}) after {} min",
                index, patient.id, patient.priority, wait
            );

            patient.ready_at = minute + patient.triage_minutes;
            self.treatment_queue.push(patient);
        }
    }

    fn assign_doctors(&mut self, minute: u32) {
        for index in 0..self.doctors.len() {
            let doctor = self.doctors[index].clone();
            if !self.on_floor(&doctor, minute) {
                continue;
            }
            let Some(patient) = take_next(&mut self.treatment_queue, minute) else {
                break;
            };

            self.doctors[index].assign(minute, patient.treatment_minutes);
            self.treated += 1;
            debug!(
                "Doctor {} treats patient {} ({})",
                index, patient.id, patient.priority
            );
        }
    }

    fn report_status(&self, minute: u32) {
        let free_doctors = self.doctors.iter().filter(|d| d.is_free(minute)).count();
        let free_nurses = self.nurses.iter().filter(|n| n.is_free(minute)).count();
        info!(
            "Status @ {} min: triage queue {}, treatment queue {}, free doctors {}, free nurses {}",
            minute,
            self.triage_queue.len(),
            self.treatment_queue.len(),
            free_doctors,
            free_nurses
        );
        for priority in Priority::ALL {
            info!(
                "Mean wait [{}]: {:.2} min",
                priority,
                mean(&self.waits[patient_slot(priority)])
            );
        }
    }

    fn finish(self) -> SimulationOutcome {
        let records: Vec<PatientRecord> = Priority::ALL
            .into_iter()
            .flat_map(|priority| {
                self.waits[patient_slot(priority)]
                    .iter()
                    .map(move |wait| PatientRecord::new(priority.as_str(), *wait))
            })
            .collect();

        let outcome = SimulationOutcome {
            triaged: records.len() as u64,
            records,
            arrivals: self.next_id,
            treated: self.treated,
            waiting_for_triage: self.triage_queue.len(),
            waiting_for_treatment: self.treatment_queue.len(),
            nurse_busy_minutes: self.nurses.iter().map(|n| n.busy_minutes).sum(),
            doctor_busy_minutes: self.doctors.iter().map(|d| d.busy_minutes).sum(),
        };
        info!(
            "Simulation finished: {} arrivals, {} triaged, {} treated",
            outcome.arrivals, outcome.triaged, outcome.treated
        );
        outcome
    }
}

fn patient_slot(priority: Priority) -> usize {
    match priority {
        Priority::High => 0,
        Priority::Medium => 1,
        Priority::Low => 2,
    }
}

/// Runs a simulation with `config`.
pub fn simulate(config: SimulationConfig) -> SimulationOutcome {
    Simulation::new(config).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_records, save_records};

    fn seeded(seed: u64) -> SimulationConfig {
        SimulationConfig::default()
            .with_seed(seed)
            .with_report_interval(0)
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let first = simulate(seeded(7));
        let second = simulate(seeded(7));
        assert_eq!(first, second);
        assert!(first.arrivals > 0);
    }

    #[test]
    fn waits_are_non_negative_and_grouped() {
        let outcome = simulate(seeded(42));
        assert!(outcome.records.iter().all(|r| r.wait_time() >= 0.0));

        let ranks: Vec<_> = outcome
            .records
            .iter()
            .map(|r| Priority::from_label(r.priority()).map(urgency))
            .collect();
        assert!(ranks.iter().all(Option::is_some));
        assert!(ranks.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn patients_are_accounted_for() {
        let outcome = simulate(seeded(3));
        assert_eq!(
            outcome.arrivals,
            outcome.triaged + outcome.waiting_for_triage as u64
        );
        assert!(outcome.treated <= outcome.triaged);
        assert_eq!(
            outcome.triaged,
            outcome.treated + outcome.waiting_for_treatment as u64
        );
    }

    #[test]
    fn no_staff_means_no_triage() {
        let outcome = simulate(seeded(1).with_nurses(0).with_minutes(120));
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.waiting_for_triage as u64, outcome.arrivals);
        assert_eq!(outcome.nurse_busy_minutes, 0);
    }

    #[test]
    fn queue_prefers_urgent_then_earliest() {
        let patient = |id, priority, arrival| Patient {
            id,
            priority,
            arrival,
            triage_minutes: 5,
            treatment_minutes: 10,
            ready_at: arrival,
        };
        let mut queue = vec![
            patient(0, Priority::Low, 0),
            patient(1, Priority::High, 4),
            patient(2, Priority::High, 2),
            patient(3, Priority::Medium, 1),
        ];
        let order: Vec<_> = std::iter::from_fn(|| take_next(&mut queue, 10))
            .map(|p| p.id)
            .collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }

    #[test]
    fn patients_wait_until_triage_is_over() {
        let mut queue = vec![Patient {
            id: 0,
            priority: Priority::High,
            arrival: 0,
            triage_minutes: 5,
            treatment_minutes: 10,
            ready_at: 5,
        }];
        assert!(take_next(&mut queue, 4).is_none());
        assert!(take_next(&mut queue, 5).is_some());
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn peak_hours_double_the_arrival_rate() {
        let config = SimulationConfig::default();
        assert!(close(config.arrival_probability(0), 10.0 / 60.0));
        assert!(close(config.arrival_probability(16 * 60), 20.0 / 60.0));
        assert!(close(config.arrival_probability(22 * 60), 10.0 / 60.0));
    }

    #[test]
    fn builders_set_every_parameter() {
        let config = SimulationConfig::new()
            .with_minutes(90)
            .with_doctors(2)
            .with_nurses(4)
            .with_seed(13)
            .with_arrival_rates(6.0, 30.0)
            .with_peak_hours(0..1)
            .with_availability(1.0);
        assert_eq!(config.minutes(), 90);
        assert_eq!(config.doctors(), 2);
        assert_eq!(config.nurses(), 4);
        assert_eq!(config.seed(), Some(13));
        assert!(close(config.arrival_probability(30), 0.5));
        assert!(close(config.arrival_probability(60), 0.1));
        assert!(close(config.arrival_probability(24 * 60), 0.5));
    }

    #[test]
    fn rates_are_capped_at_one_arrival_per_minute() {
        let config = SimulationConfig::new().with_arrival_rates(600.0, f64::INFINITY);
        assert_eq!(config.arrival_probability(0), 1.0);
        assert_eq!(config.arrival_probability(17 * 60), 1.0);
    }

    #[test]
    fn invalid_rates_mean_no_arrivals() {
        let config = seeded(2)
            .with_minutes(200)
            .with_arrival_rates(f64::NAN, -5.0);
        assert_eq!(config.arrival_probability(0), 0.0);
        assert_eq!(config.arrival_probability(16 * 60), 0.0);

        let outcome = simulate(config);
        assert_eq!(outcome.arrivals, 0);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn unavailable_staff_never_take_patients() {
        for availability in [f64::NAN, -1.0, 0.0] {
            let outcome = simulate(seeded(4).with_availability(availability));
            assert!(outcome.arrivals > 0);
            assert_eq!(outcome.triaged, 0);
            assert_eq!(outcome.nurse_busy_minutes, 0);
        }
    }

    #[test]
    fn always_available_staff_triage_on_arrival() {
        let config = seeded(8)
            .with_minutes(300)
            .with_arrival_rates(6.0, 6.0)
            .with_nurses(10)
            .with_availability(2.0);
        let outcome = simulate(config);
        assert!(outcome.triaged > 0);
        assert!(outcome.records.iter().all(|r| r.wait_time() == 0.0));
    }

    #[test]
    fn written_dataset_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("statystyki.csv");
        let outcome = simulate(seeded(11));

        save_records(&path, &outcome.records, b',').expect("save");
        let loaded = load_records(&path, b',').expect("load");
        assert_eq!(loaded, outcome.records);
    }
}
