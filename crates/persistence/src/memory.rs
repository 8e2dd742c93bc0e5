//! In-memory repository implementations.
//!
//! Backs the default binary wiring and every offline test. Conditional
//! alert mutations run entirely inside one write-lock critical section,
//! which is what makes them equivalent to the transactional conditional
//! updates a durable implementation would use.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::models::{Alert, AlertDraft, AlertKind, Animal, Collar, Geofence, PositionReport};

use crate::error::RepositoryError;
use crate::repositories::{
    AlertRepository, AnimalRepository, CollarRepository, GeofenceRepository, PositionRepository,
};

/// In-memory animal store.
#[derive(Default)]
pub struct MemoryAnimalRepository {
    animals: RwLock<HashMap<Uuid, Animal>>,
}

impl MemoryAnimalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AnimalRepository for MemoryAnimalRepository {
    async fn insert(&self, animal: Animal) -> Result<Animal, RepositoryError> {
        let mut animals = self.animals.write().await;
        if animals.contains_key(&animal.animal_id) {
            return Err(RepositoryError::Conflict(format!(
                "animal {} already exists",
                animal.animal_id
            )));
        }
        animals.insert(animal.animal_id, animal.clone());
        Ok(animal)
    }

    async fn find_by_id(&self, animal_id: Uuid) -> Result<Option<Animal>, RepositoryError> {
        Ok(self.animals.read().await.get(&animal_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Animal>, RepositoryError> {
        let mut all: Vec<_> = self.animals.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}

/// In-memory collar store.
#[derive(Default)]
pub struct MemoryCollarRepository {
    collars: RwLock<HashMap<Uuid, Collar>>,
}

impl MemoryCollarRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CollarRepository for MemoryCollarRepository {
    async fn insert(&self, collar: Collar) -> Result<Collar, RepositoryError> {
        let mut collars = self.collars.write().await;
        if collars.contains_key(&collar.collar_id) {
            return Err(RepositoryError::Conflict(format!(
                "collar {} already exists",
                collar.collar_id
            )));
        }
        collars.insert(collar.collar_id, collar.clone());
        Ok(collar)
    }

    async fn find_by_id(&self, collar_id: Uuid) -> Result<Option<Collar>, RepositoryError> {
        Ok(self.collars.read().await.get(&collar_id).cloned())
    }

    async fn find_by_animal_id(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<Collar>, RepositoryError> {
        Ok(self
            .collars
            .read()
            .await
            .values()
            .find(|c| c.animal_id == Some(animal_id))
            .cloned())
    }

    async fn record_signal(
        &self,
        collar_id: Uuid,
        battery_level: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<Option<Collar>, RepositoryError> {
        let mut collars = self.collars.write().await;
        Ok(collars.get_mut(&collar_id).map(|collar| {
            if battery_level.is_some() {
                collar.battery_level = battery_level;
            }
            collar.online = true;
            collar.last_signal_at = Some(now);
            collar.updated_at = now;
            collar.clone()
        }))
    }

    async fn set_online(
        &self,
        collar_id: Uuid,
        online: bool,
    ) -> Result<Option<Collar>, RepositoryError> {
        let mut collars = self.collars.write().await;
        Ok(collars.get_mut(&collar_id).map(|collar| {
            collar.online = online;
            collar.updated_at = Utc::now();
            collar.clone()
        }))
    }

    async fn find_monitorable(&self) -> Result<Vec<Collar>, RepositoryError> {
        Ok(self
            .collars
            .read()
            .await
            .values()
            .filter(|c| c.is_monitorable())
            .cloned()
            .collect())
    }
}

/// In-memory geofence store.
#[derive(Default)]
pub struct MemoryGeofenceRepository {
    geofences: RwLock<HashMap<Uuid, Geofence>>,
}

impl MemoryGeofenceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl GeofenceRepository for MemoryGeofenceRepository {
    async fn insert(&self, geofence: Geofence) -> Result<Geofence, RepositoryError> {
        let mut geofences = self.geofences.write().await;
        if geofences.contains_key(&geofence.geofence_id) {
            return Err(RepositoryError::Conflict(format!(
                "geofence {} already exists",
                geofence.geofence_id
            )));
        }
        geofences.insert(geofence.geofence_id, geofence.clone());
        Ok(geofence)
    }

    async fn find_by_id(
        &self,
        geofence_id: Uuid,
    ) -> Result<Option<Geofence>, RepositoryError> {
        Ok(self.geofences.read().await.get(&geofence_id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<Geofence>, RepositoryError> {
        Ok(self
            .geofences
            .read()
            .await
            .values()
            .filter(|g| g.active)
            .cloned()
            .collect())
    }
}

/// In-memory append-only position store.
#[derive(Default)]
pub struct MemoryPositionRepository {
    reports: RwLock<Vec<PositionReport>>,
}

impl MemoryPositionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PositionRepository for MemoryPositionRepository {
    async fn append(&self, report: PositionReport) -> Result<PositionReport, RepositoryError> {
        self.reports.write().await.push(report.clone());
        Ok(report)
    }

    async fn find_latest(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<PositionReport>, RepositoryError> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.animal_id == animal_id)
            .cloned())
    }

    async fn find_for_animal(
        &self,
        animal_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PositionReport>, RepositoryError> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.animal_id == animal_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory alert store.
#[derive(Default)]
pub struct MemoryAlertRepository {
    alerts: RwLock<HashMap<Uuid, Alert>>,
}

impl MemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn insert_if_none_active(
        &self,
        draft: AlertDraft,
    ) -> Result<Option<Alert>, RepositoryError> {
        let mut alerts = self.alerts.write().await;

        // Invariant check and insert happen under the same write lock.
        let duplicate = alerts
            .values()
            .any(|a| a.active && a.animal_id == draft.animal_id && a.kind == draft.kind);
        if duplicate {
            return Ok(None);
        }

        let now = Utc::now();
        let alert = Alert {
            alert_id: Uuid::new_v4(),
            animal_id: draft.animal_id,
            kind: draft.kind,
            severity: draft.severity,
            title: draft.title,
            description: draft.description,
            active: true,
            escalated: draft.escalated,
            escalated_at: draft.escalated_at,
            push_sent: false,
            created_at: now,
            updated_at: now,
        };
        alerts.insert(alert.alert_id, alert.clone());
        Ok(Some(alert))
    }

    async fn find_active(
        &self,
        animal_id: Uuid,
        kind: AlertKind,
    ) -> Result<Option<Alert>, RepositoryError> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .find(|a| a.active && a.animal_id == animal_id && a.kind == kind)
            .cloned())
    }

    async fn find_by_id(&self, alert_id: Uuid) -> Result<Option<Alert>, RepositoryError> {
        Ok(self.alerts.read().await.get(&alert_id).cloned())
    }

    async fn find_for_animal(
        &self,
        animal_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Alert>, RepositoryError> {
        let alerts = self.alerts.read().await;
        let mut matching: Vec<_> = alerts
            .values()
            .filter(|a| a.animal_id == animal_id && (include_inactive || a.active))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn find_escalation_due(
        &self,
        kind: AlertKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Alert>, RepositoryError> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.active && !a.escalated && a.kind == kind && a.created_at <= cutoff)
            .cloned()
            .collect())
    }

    async fn deactivate(&self, alert_id: Uuid) -> Result<Option<Alert>, RepositoryError> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&alert_id) {
            Some(alert) if alert.active => {
                alert.active = false;
                alert.updated_at = Utc::now();
                Ok(Some(alert.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn escalate(
        &self,
        alert_id: Uuid,
        title: String,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Alert>, RepositoryError> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&alert_id) {
            Some(alert) if alert.active && !alert.escalated => {
                alert.severity = domain::models::AlertSeverity::Urgent;
                alert.escalated = true;
                alert.escalated_at = Some(now);
                alert.title = title;
                alert.description = description;
                alert.updated_at = now;
                Ok(Some(alert.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_push_sent(&self, alert_id: Uuid) -> Result<bool, RepositoryError> {
        let mut alerts = self.alerts.write().await;
        match alerts.get_mut(&alert_id) {
            Some(alert) if !alert.push_sent => {
                alert.push_sent = true;
                alert.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Convenience bundle wiring every in-memory repository together.
#[derive(Clone)]
pub struct MemoryStore {
    pub animals: Arc<MemoryAnimalRepository>,
    pub collars: Arc<MemoryCollarRepository>,
    pub geofences: Arc<MemoryGeofenceRepository>,
    pub positions: Arc<MemoryPositionRepository>,
    pub alerts: Arc<MemoryAlertRepository>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            animals: Arc::new(MemoryAnimalRepository::new()),
            collars: Arc::new(MemoryCollarRepository::new()),
            geofences: Arc::new(MemoryGeofenceRepository::new()),
            positions: Arc::new(MemoryPositionRepository::new()),
            alerts: Arc::new(MemoryAlertRepository::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
