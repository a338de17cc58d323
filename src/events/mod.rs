use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted after a ledger mutation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ResourceAssigned {
        resource_type: String,
        resource_id: Uuid,
        obra_id: Uuid,
    },
    ResourceReturned {
        resource_type: String,
        resource_id: Uuid,
        obra_id: Uuid,
    },
    StockMoved {
        material_id: Uuid,
        direcao: String,
        quantidade: Decimal,
        previous_stock: Decimal,
        new_stock: Decimal,
    },
    /// Emitted when a saida drops a material to or below its minimum
    LowStock {
        material_id: Uuid,
        stock_atual: Decimal,
        stock_minimo: Decimal,
    },
    MaintenanceChanged {
        resource_type: String,
        resource_id: Uuid,
        em_manutencao: bool,
    },
    TripRecorded {
        vehicle_id: Uuid,
        km_inicial: i64,
        km_final: i64,
    },
}

/// Consumes committed domain events and logs them. Runs for the lifetime
/// of the server in its own task.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::ResourceAssigned {
                resource_type,
                resource_id,
                obra_id,
            } => {
                info!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    obra_id = %obra_id,
                    "Resource assigned to site"
                );
            }
            Event::ResourceReturned {
                resource_type,
                resource_id,
                obra_id,
            } => {
                info!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    obra_id = %obra_id,
                    "Resource returned to warehouse"
                );
            }
            Event::StockMoved {
                material_id,
                direcao,
                quantidade,
                previous_stock,
                new_stock,
            } => {
                info!(
                    material_id = %material_id,
                    direcao = %direcao,
                    quantidade = %quantidade,
                    previous_stock = %previous_stock,
                    new_stock = %new_stock,
                    "Stock moved"
                );
            }
            Event::LowStock {
                material_id,
                stock_atual,
                stock_minimo,
            } => {
                warn!(
                    material_id = %material_id,
                    stock_atual = %stock_atual,
                    stock_minimo = %stock_minimo,
                    "Material at or below minimum stock"
                );
            }
            Event::MaintenanceChanged {
                resource_type,
                resource_id,
                em_manutencao,
            } => {
                info!(
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    em_manutencao = %em_manutencao,
                    "Maintenance flag changed"
                );
            }
            Event::TripRecorded {
                vehicle_id,
                km_inicial,
                km_final,
            } => {
                info!(
                    vehicle_id = %vehicle_id,
                    km_inicial = %km_inicial,
                    km_final = %km_final,
                    "Vehicle trip recorded"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}
