// INICIO DEL ARCHIVO [apps/orchestrator/src/services/chronos.rs]
/**
 * =================================================================
 * APARATO: CHRONOS PACEMAKER SERVICE (V25.1 - SEALED)
 * CLASIFICACIÓN: INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: PREVENCIÓN DE SUSPENSIÓN Y REPORTE DE ORIGEN
 * =================================================================
 */

use reqwest::Client;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn, error, instrument};

pub struct ChronosPacemaker;

impl ChronosPacemaker {
    /**
     * Inicia el bucle de preservación de instancia en el runtime de Tokio.
     *
     * # Performance:
     * Utiliza un ticker de 14 minutos, optimizado para el tier gratuito de Render.
     *
     * @param target_endpoint_url La URL pública del servicio.
     * @param service_origin_identifier Nombre de la instancia (Render/Staging/Local).
     */
    #[instrument(skip(target_endpoint_url, service_origin_identifier))]
    pub async fn ignite_pacemaker_loop(
        target_endpoint_url: String,
        service_origin_identifier: String
    ) {
        // Evitar auto-pulsos en entornos de desarrollo local
        if target_endpoint_url.contains("localhost") || target_endpoint_url.contains("127.0.0.1") {
            info!("🕰️ [CHRONOS]: local_environment_detected. Pacemaker in standby mode.");
            return;
        }

        info!(
            "🕰️ [CHRONOS]: Initiating preservation sequence for node [{}] at endpoint [{}]",
            service_origin_identifier,
            target_endpoint_url
        );

        let network_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Prospector-Chronos-V25")
            .build()
            .expect("FATAL_CHRONOS: Failed to initialize network client.");

        let mut maintenance_ticker = interval(Duration::from_secs(14 * 60));
        let pulse_target_path = format!("{}/health", target_endpoint_url.trim_end_matches('/'));

        tokio::spawn(async move {
            loop {
                maintenance_ticker.tick().await;

                info!("💓 [CHRONOS]: Emitting heartbeat pulse from [{}]...", service_origin_identifier);

                match network_client.get(&pulse_target_path).send().await {
                    Ok(response) => {
                        if response.status().is_success() {
                            info!("✅ [CHRONOS_ACK]: Vital signs normal. Instance state: PERSISTENT.");
                        } else {
                            warn!("⚠️ [CHRONOS_REJECTION]: Gateway returned non-success: {}", response.status());
                        }
                    }
                    Err(fault) => {
                        error!("❌ [CHRONOS_FAULT]: Signal delivery failed: {}", fault);
                    }
                }
            }
        });
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/services/chronos.rs]
