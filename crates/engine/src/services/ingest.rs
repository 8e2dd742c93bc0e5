//! Position ingestion.
//!
//! The entry point the external ingestion adapter (HTTP/MQTT) hands
//! reports to. Recording persists the report, refreshes collar state and
//! drives containment plus battery evaluation.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use tracing::{info, warn};
use validator::Validate;

use domain::containment::{is_in_any_safe_zone, LatLng};
use domain::models::position::{PositionReport, RecordPositionRequest};
use domain::models::Collar;
use persistence::repositories::{
    AnimalRepository, CollarRepository, GeofenceRepository, PositionRepository,
};

use crate::error::EngineError;
use crate::services::alerts::AlertLifecycleManager;

/// Records position reports and triggers evaluation.
pub struct PositionIngestor {
    animals: Arc<dyn AnimalRepository>,
    collars: Arc<dyn CollarRepository>,
    geofences: Arc<dyn GeofenceRepository>,
    positions: Arc<dyn PositionRepository>,
    manager: Arc<AlertLifecycleManager>,
    low_battery_floor_percent: i32,
}

impl PositionIngestor {
    pub fn new(
        animals: Arc<dyn AnimalRepository>,
        collars: Arc<dyn CollarRepository>,
        geofences: Arc<dyn GeofenceRepository>,
        positions: Arc<dyn PositionRepository>,
        manager: Arc<AlertLifecycleManager>,
        low_battery_floor_percent: i32,
    ) -> Self {
        Self {
            animals,
            collars,
            geofences,
            positions,
            manager,
            low_battery_floor_percent,
        }
    }

    /// Records a report and runs the evaluation pipeline.
    ///
    /// The report is persisted before any evaluation; a geofence with an
    /// unusable boundary degrades only itself, never the pipeline.
    pub async fn record(
        &self,
        request: RecordPositionRequest,
    ) -> Result<PositionReport, EngineError> {
        request.validate()?;

        let animal = self
            .animals
            .find_by_id(request.animal_id)
            .await?
            .ok_or(EngineError::UnknownAnimal(request.animal_id))?;

        let now = Utc::now();
        let report = self.positions.append(request.into_report(now)).await?;
        counter!("position_reports_total").increment(1);

        self.touch_collar(&report).await?;

        let geofences = self.geofences.find_active().await?;
        let contained = is_in_any_safe_zone(
            LatLng::new(report.latitude, report.longitude),
            &geofences,
        );
        self.manager.on_position_evaluated(&animal, contained).await?;

        if let Some(level) = report.battery_level {
            self.manager
                .on_battery_evaluated(&animal, level, self.low_battery_floor_percent)
                .await?;
        }

        Ok(report)
    }

    /// Refreshes the reporting animal's collar, auto-provisioning a
    /// record when the hardware was never registered.
    async fn touch_collar(&self, report: &PositionReport) -> Result<(), EngineError> {
        let collar = match self.collars.find_by_animal_id(report.animal_id).await? {
            Some(collar) => collar,
            None => {
                let provisioned = self
                    .collars
                    .insert(Collar::provisioned_for(report.animal_id))
                    .await?;
                warn!(
                    animal_id = %report.animal_id,
                    collar_id = %provisioned.collar_id,
                    serial = %provisioned.serial,
                    "Auto-provisioned collar for unregistered hardware"
                );
                provisioned
            }
        };

        if self
            .collars
            .record_signal(collar.collar_id, report.battery_level, report.recorded_at)
            .await?
            .is_none()
        {
            // Collar vanished between lookup and update; the next report
            // will provision again.
            info!(collar_id = %collar.collar_id, "Collar disappeared during signal update");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{Animal, Geofence};
    use domain::services::MockPushSender;
    use persistence::memory::MemoryStore;
    use persistence::repositories::AlertRepository;
    use uuid::Uuid;

    use crate::services::dispatch::NotificationDispatcher;

    fn build(store: &MemoryStore) -> PositionIngestor {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            64,
            Vec::new(),
            Arc::new(MockPushSender::new()),
        ));
        let manager = Arc::new(AlertLifecycleManager::new(
            store.alerts.clone(),
            dispatcher,
        ));
        PositionIngestor::new(
            store.animals.clone(),
            store.collars.clone(),
            store.geofences.clone(),
            store.positions.clone(),
            manager,
            20,
        )
    }

    fn request(animal_id: Uuid, lat: f64, lng: f64) -> RecordPositionRequest {
        RecordPositionRequest {
            animal_id,
            latitude: lat,
            longitude: lng,
            accuracy: Some(5.0),
            battery_level: Some(90),
        }
    }

    #[tokio::test]
    async fn test_record_persists_report_and_collar_state() {
        let store = MemoryStore::new();
        let animal = store.animals.insert(Animal::new("Bella", None)).await.unwrap();
        let ingestor = build(&store);

        let report = ingestor
            .record(request(animal.animal_id, 5.0, 5.0))
            .await
            .unwrap();

        let stored = store
            .positions
            .find_latest(animal.animal_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.report_id, report.report_id);

        // Collar was auto-provisioned and refreshed.
        let collar = store
            .collars
            .find_by_animal_id(animal.animal_id)
            .await
            .unwrap()
            .unwrap();
        assert!(collar.online);
        assert_eq!(collar.battery_level, Some(90));
        assert_eq!(collar.last_signal_at, Some(report.recorded_at));
    }

    #[tokio::test]
    async fn test_record_rejects_unknown_animal() {
        let store = MemoryStore::new();
        let ingestor = build(&store);

        let result = ingestor.record(request(Uuid::new_v4(), 5.0, 5.0)).await;
        assert!(matches!(result, Err(EngineError::UnknownAnimal(_))));
    }

    #[tokio::test]
    async fn test_record_rejects_invalid_coordinates() {
        let store = MemoryStore::new();
        let animal = store.animals.insert(Animal::new("Bella", None)).await.unwrap();
        let ingestor = build(&store);

        let result = ingestor.record(request(animal.animal_id, 95.0, 5.0)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));

        // Nothing persisted on validation failure.
        assert!(store
            .positions
            .find_latest(animal.animal_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_outside_safe_zone_opens_alert() {
        let store = MemoryStore::new();
        let animal = store.animals.insert(Animal::new("Bella", None)).await.unwrap();
        store
            .geofences
            .insert(Geofence::new(
                "Paddock",
                serde_json::json!([[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
            ))
            .await
            .unwrap();
        let ingestor = build(&store);

        ingestor
            .record(request(animal.animal_id, 50.0, 50.0))
            .await
            .unwrap();
        let active = store
            .alerts
            .find_active(animal.animal_id, domain::models::AlertKind::Geofence)
            .await
            .unwrap();
        assert!(active.is_some());

        // Walking back inside dismisses it.
        ingestor
            .record(request(animal.animal_id, 5.0, 5.0))
            .await
            .unwrap();
        let active = store
            .alerts
            .find_active(animal.animal_id, domain::models::AlertKind::Geofence)
            .await
            .unwrap();
        assert!(active.is_none());
    }

    #[tokio::test]
    async fn test_malformed_geofence_does_not_break_pipeline() {
        let store = MemoryStore::new();
        let animal = store.animals.insert(Animal::new("Bella", None)).await.unwrap();
        store
            .geofences
            .insert(Geofence::new("Broken", serde_json::json!({"not": "a polygon"})))
            .await
            .unwrap();
        store
            .geofences
            .insert(Geofence::new(
                "Paddock",
                serde_json::json!([[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
            ))
            .await
            .unwrap();
        let ingestor = build(&store);

        // Inside the good fence: no alert despite the broken one.
        ingestor
            .record(request(animal.animal_id, 5.0, 5.0))
            .await
            .unwrap();
        assert!(store
            .alerts
            .find_active(animal.animal_id, domain::models::AlertKind::Geofence)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_low_battery_report_opens_and_clears_alert() {
        let store = MemoryStore::new();
        let animal = store.animals.insert(Animal::new("Bella", None)).await.unwrap();
        store
            .geofences
            .insert(Geofence::new(
                "Paddock",
                serde_json::json!([[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]),
            ))
            .await
            .unwrap();
        let ingestor = build(&store);

        let mut low = request(animal.animal_id, 5.0, 5.0);
        low.battery_level = Some(15);
        ingestor.record(low).await.unwrap();

        let active = store
            .alerts
            .find_active(animal.animal_id, domain::models::AlertKind::LowBattery)
            .await
            .unwrap();
        assert!(active.is_some());

        let mut recovered = request(animal.animal_id, 5.0, 5.0);
        recovered.battery_level = Some(60);
        ingestor.record(recovered).await.unwrap();

        assert!(store
            .alerts
            .find_active(animal.animal_id, domain::models::AlertKind::LowBattery)
            .await
            .unwrap()
            .is_none());
    }
}
