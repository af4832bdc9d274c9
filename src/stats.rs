//! Aggregates derived from the contact and encounter collections.
//!
//! Everything here is recomputed on each call from borrowed slices; nothing is
//! cached between calls.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;

use crate::{
    record::{Contact, Encounter},
    types::ContactId,
};

/// Per-contact totals shown on a contact card.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactSummary {
    /// Sum of the contact's encounter amounts.
    pub total_spent: f64,
    /// Number of encounters.
    pub encounter_count: usize,
    /// Date of the most recent encounter.
    pub last_encounter: Option<DateTime<Utc>>,
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overview {
    /// See [`Stats::total_spent`].
    pub total_spent: f64,
    /// See [`Stats::total_encounters`].
    pub total_encounters: usize,
    /// See [`Stats::average_per_encounter`].
    pub average_per_encounter: f64,
    /// See [`Stats::total_contacts`].
    pub total_contacts: usize,
    /// See [`Stats::most_expensive_contact`].
    pub most_expensive: Option<Contact>,
}

/// Read-only statistics view over a pair of collections.
#[derive(Debug, Clone, Copy)]
pub struct Stats<'a> {
    contacts: &'a [Contact],
    encounters: &'a [Encounter],
}

impl<'a> Stats<'a> {
    /// Builds a view over the given collections.
    pub fn new(contacts: &'a [Contact], encounters: &'a [Encounter]) -> Self {
        Self {
            contacts,
            encounters,
        }
    }

    /// Sum of all amounts; zero when empty.
    pub fn total_spent(&self) -> f64 {
        sum_amounts(self.encounters.iter())
    }

    /// Number of encounters.
    pub fn total_encounters(&self) -> usize {
        self.encounters.len()
    }

    /// Number of contacts.
    pub fn total_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Zero when there are no encounters.
    pub fn average_per_encounter(&self) -> f64 {
        average(self.total_spent(), self.total_encounters())
    }

    /// Spend per contact. Contacts without encounters have no entry.
    pub fn spending_by_contact(&self) -> HashMap<ContactId, f64> {
        self.spending_in_first_seen_order().into_iter().collect()
    }

    /// Contact with the highest total spend.
    ///
    /// Ties go to the contact whose first encounter comes earliest in the
    /// encounter list.
    pub fn most_expensive_contact(&self) -> Option<&'a Contact> {
        let mut best: Option<(ContactId, f64)> = None;
        for (id, spent) in self.spending_in_first_seen_order() {
            match best {
                Some((_, top)) if spent <= top => {}
                _ => best = Some((id, spent)),
            }
        }

        let (id, _) = best?;
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Encounters for `contact_id`, most recent first. Equal dates keep
    /// insertion order.
    pub fn encounters_for_contact(
        &self,
        contact_id: ContactId,
    ) -> std::vec::IntoIter<&'a Encounter> {
        let mut out: Vec<&'a Encounter> = self
            .encounters
            .iter()
            .filter(|e| e.contact_id == contact_id)
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        out.into_iter()
    }

    /// Totals for one contact; zeroed for unknown ids.
    pub fn contact_summary(&self, contact_id: ContactId) -> ContactSummary {
        let mine = || self.encounters.iter().filter(move |e| e.contact_id == contact_id);
        ContactSummary {
            total_spent: sum_amounts(mine()),
            encounter_count: mine().count(),
            last_encounter: mine().map(|e| e.date).max(),
        }
    }

    /// All dashboard figures at once.
    pub fn overview(&self) -> Overview {
        let total_spent = self.total_spent();
        let total_encounters = self.total_encounters();
        Overview {
            total_spent,
            total_encounters,
            average_per_encounter: average(total_spent, total_encounters),
            total_contacts: self.total_contacts(),
            most_expensive: self.most_expensive_contact().cloned(),
        }
    }

    fn spending_in_first_seen_order(&self) -> Vec<(ContactId, f64)> {
        let mut slot: HashMap<ContactId, usize> = HashMap::new();
        let mut out: Vec<(ContactId, f64)> = Vec::new();
        for e in self.encounters {
            let amount = e.amount.value();
            match slot.get(&e.contact_id) {
                Some(&i) => out[i].1 += amount,
                None => {
                    slot.insert(e.contact_id, out.len());
                    out.push((e.contact_id, amount));
                }
            }
        }
        out
    }
}

fn sum_amounts<'e>(encounters: impl Iterator<Item = &'e Encounter>) -> f64 {
    encounters.fold(0.0, |acc, e| acc + e.amount.value())
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
