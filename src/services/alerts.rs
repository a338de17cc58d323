use crate::entities::{material, vehicle};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Days ahead of a deadline date at which an alert enters the window.
const DATE_WINDOW_DAYS: i64 = 30;
/// Days ahead of a deadline date at which an alert becomes urgent.
const DATE_URGENT_DAYS: i64 = 7;
/// Kilometers ahead of the next service at which an alert enters the window.
const KM_WINDOW: i64 = 1000;
/// Kilometers ahead of the next service at which an alert becomes urgent.
const KM_URGENT: i64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Vistoria,
    Seguro,
    Revisao,
    RevisaoKms,
    StockBaixo,
}

/// One actionable alert derived from current state. Alerts are computed on
/// demand and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub tipo: AlertKind,
    pub recurso_id: Uuid,
    /// Business identifier: vehicle plate or material code
    pub identificador: String,
    pub descricao: String,
    pub mensagem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_restantes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_restantes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_atual: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_minimo: Option<Decimal>,
    pub urgente: bool,
    pub expirado: bool,
}

fn date_label(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Vistoria => "Vistoria",
        AlertKind::Seguro => "Seguro",
        AlertKind::Revisao => "Revisao",
        AlertKind::RevisaoKms => "Revisao (kms)",
        AlertKind::StockBaixo => "Stock",
    }
}

fn date_alert(
    kind: AlertKind,
    vehicle: &vehicle::Model,
    deadline: NaiveDate,
    today: NaiveDate,
) -> Option<Alert> {
    let days_remaining = (deadline - today).num_days();
    if days_remaining > DATE_WINDOW_DAYS {
        return None;
    }

    let expired = days_remaining < 0;
    let mensagem = if expired {
        format!(
            "{} da viatura {} expirou em {}",
            date_label(kind),
            vehicle.matricula,
            deadline
        )
    } else {
        format!(
            "{} da viatura {} expira em {} dia(s)",
            date_label(kind),
            vehicle.matricula,
            days_remaining
        )
    };

    Some(Alert {
        tipo: kind,
        recurso_id: vehicle.id,
        identificador: vehicle.matricula.clone(),
        descricao: describe_vehicle(vehicle),
        mensagem,
        dias_restantes: Some(days_remaining),
        kms_restantes: None,
        stock_atual: None,
        stock_minimo: None,
        urgente: days_remaining <= DATE_URGENT_DAYS,
        expirado: expired,
    })
}

fn describe_vehicle(vehicle: &vehicle::Model) -> String {
    match (&vehicle.marca, &vehicle.modelo) {
        (Some(marca), Some(modelo)) => format!("{} {}", marca, modelo),
        (Some(marca), None) => marca.clone(),
        (None, Some(modelo)) => modelo.clone(),
        (None, None) => vehicle.matricula.clone(),
    }
}

/// Evaluates every deadline of one vehicle. Inactive vehicles and missing
/// dates yield nothing.
pub fn evaluate_vehicle(vehicle: &vehicle::Model, today: NaiveDate) -> Vec<Alert> {
    if !vehicle.ativo {
        return Vec::new();
    }

    let mut alerts = Vec::new();

    if let Some(date) = vehicle.data_vistoria {
        alerts.extend(date_alert(AlertKind::Vistoria, vehicle, date, today));
    }
    if let Some(date) = vehicle.data_seguro {
        alerts.extend(date_alert(AlertKind::Seguro, vehicle, date, today));
    }
    if let Some(date) = vehicle.data_proxima_revisao {
        alerts.extend(date_alert(AlertKind::Revisao, vehicle, date, today));
    }

    if let Some(next_service) = vehicle.proxima_revisao_kms {
        let km_remaining = next_service - vehicle.kms_atual;
        if km_remaining <= KM_WINDOW {
            let expired = km_remaining < 0;
            let mensagem = if expired {
                format!(
                    "Revisao da viatura {} ultrapassada em {} km",
                    vehicle.matricula, -km_remaining
                )
            } else {
                format!(
                    "Revisao da viatura {} em {} km",
                    vehicle.matricula, km_remaining
                )
            };
            alerts.push(Alert {
                tipo: AlertKind::RevisaoKms,
                recurso_id: vehicle.id,
                identificador: vehicle.matricula.clone(),
                descricao: describe_vehicle(vehicle),
                mensagem,
                dias_restantes: None,
                kms_restantes: Some(km_remaining),
                stock_atual: None,
                stock_minimo: None,
                urgente: km_remaining <= KM_URGENT,
                expirado: expired,
            });
        }
    }

    alerts
}

/// Low-stock check for one material. A `stock_minimo` of zero disables the
/// alert; the alert turns urgent when the stock is fully depleted.
pub fn evaluate_material(material: &material::Model) -> Option<Alert> {
    if !material.ativo || !material.is_below_minimum() {
        return None;
    }

    let depleted = material.stock_atual == Decimal::ZERO;
    let mensagem = if depleted {
        format!("Material {} esgotado", material.codigo)
    } else {
        format!(
            "Material {} abaixo do minimo ({} {} <= {})",
            material.codigo, material.stock_atual, material.unidade, material.stock_minimo
        )
    };

    Some(Alert {
        tipo: AlertKind::StockBaixo,
        recurso_id: material.id,
        identificador: material.codigo.clone(),
        descricao: material.descricao.clone(),
        mensagem,
        dias_restantes: None,
        kms_restantes: None,
        stock_atual: Some(material.stock_atual),
        stock_minimo: Some(material.stock_minimo),
        urgente: depleted,
        expirado: false,
    })
}

/// Full alert sweep over current state.
pub fn evaluate_all(
    vehicles: &[vehicle::Model],
    materials: &[material::Model],
    today: NaiveDate,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = vehicles
        .iter()
        .flat_map(|v| evaluate_vehicle(v, today))
        .collect();
    alerts.extend(materials.iter().filter_map(evaluate_material));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn test_vehicle() -> vehicle::Model {
        vehicle::Model {
            id: Uuid::new_v4(),
            matricula: "AA-12-BB".to_string(),
            marca: Some("Toyota".to_string()),
            modelo: Some("Hilux".to_string()),
            combustivel: "Gasoleo".to_string(),
            ativo: true,
            em_manutencao: false,
            motivo_manutencao: None,
            obra_id: None,
            kms_atual: 0,
            proxima_revisao_kms: None,
            data_vistoria: None,
            data_seguro: None,
            data_proxima_revisao: None,
            apolice_seguro: None,
            observacoes: None,
            created_at: Utc::now(),
        }
    }

    fn test_material(stock_atual: Decimal, stock_minimo: Decimal) -> material::Model {
        material::Model {
            id: Uuid::new_v4(),
            codigo: "MAT-001".to_string(),
            descricao: "Cimento".to_string(),
            unidade: "saco".to_string(),
            stock_atual,
            stock_minimo,
            ativo: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insurance_five_days_out_is_urgent_not_expired() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.data_seguro = Some(today + Duration::days(5));

        let alerts = evaluate_vehicle(&v, today);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].tipo, AlertKind::Seguro);
        assert!(alerts[0].urgente);
        assert!(!alerts[0].expirado);
        assert_eq!(alerts[0].dias_restantes, Some(5));
    }

    #[test]
    fn deadline_outside_window_is_silent() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.data_vistoria = Some(today + Duration::days(31));

        assert!(evaluate_vehicle(&v, today).is_empty());
    }

    #[test]
    fn deadline_exactly_thirty_days_enters_window() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.data_vistoria = Some(today + Duration::days(30));

        let alerts = evaluate_vehicle(&v, today);
        assert_eq!(alerts.len(), 1);
        assert!(!alerts[0].urgente);
        assert!(!alerts[0].expirado);
    }

    #[test]
    fn past_deadline_is_expired_and_urgent() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.data_seguro = Some(today - Duration::days(3));

        let alerts = evaluate_vehicle(&v, today);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].expirado);
        assert!(alerts[0].urgente);
        assert_eq!(alerts[0].dias_restantes, Some(-3));
    }

    #[test]
    fn inactive_vehicle_never_alerts() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.ativo = false;
        v.data_seguro = Some(today);

        assert!(evaluate_vehicle(&v, today).is_empty());
    }

    #[test]
    fn km_service_window_and_urgency() {
        let today = Utc::now().date_naive();
        let mut v = test_vehicle();
        v.kms_atual = 119_800;
        v.proxima_revisao_kms = Some(120_000);

        let alerts = evaluate_vehicle(&v, today);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].tipo, AlertKind::RevisaoKms);
        assert_eq!(alerts[0].kms_restantes, Some(200));
        assert!(alerts[0].urgente);
        assert!(!alerts[0].expirado);
    }

    #[test]
    fn low_stock_alert_and_depletion_urgency() {
        let below = test_material(dec!(3), dec!(5));
        let alert = evaluate_material(&below).expect("alert for stock below minimum");
        assert!(!alert.urgente);

        let depleted = test_material(dec!(0), dec!(5));
        let alert = evaluate_material(&depleted).expect("alert for depleted stock");
        assert!(alert.urgente);
    }

    #[test]
    fn zero_minimum_disables_low_stock_alert() {
        let m = test_material(dec!(0), dec!(0));
        assert!(evaluate_material(&m).is_none());
    }
}
