// src/services/digest_service.rs

use chrono::{DateTime, Utc};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    common::error::AppError,
    db::ProcessRepository,
    models::digest::{DigestOutcome, OverdueRow},
    services::mail::{InlineImage, MailTransport, OutgoingMail},
};

const SUBJECT: &str = "Processos com prazo vencido";

// (content-id, arquivo dentro da pasta de assets)
const INLINE_IMAGES: [(&str, &str); 3] = [
    ("header", "header.png"),
    ("logo", "logo.png"),
    ("footer", "footer.png"),
];

#[derive(Clone)]
pub struct DigestService {
    processes: Arc<dyn ProcessRepository>,
    // None = credencial do remetente não configurada: nada é enviado
    mailer: Option<Arc<dyn MailTransport>>,
    assets_dir: PathBuf,
}

impl DigestService {
    pub fn new(
        processes: Arc<dyn ProcessRepository>,
        mailer: Option<Arc<dyn MailTransport>>,
        assets_dir: PathBuf,
    ) -> Self {
        Self { processes, mailer, assets_dir }
    }

    /// Envia um e-mail por destinatário distinto com os processos atrasados dele.
    /// Um erro de transporte interrompe o laço; quem já recebeu não é desfeito.
    pub async fn send_overdue_digest(&self) -> Result<DigestOutcome, AppError> {
        let Some(mailer) = &self.mailer else {
            tracing::warn!("Resumo de atrasos ignorado: SMTP_PASSWORD não configurada");
            return Ok(DigestOutcome::default());
        };

        let rows = self.processes.find_overdue().await?;
        if rows.is_empty() {
            tracing::info!("Nenhum processo atrasado; nenhum e-mail enviado");
            return Ok(DigestOutcome::default());
        }

        let images = load_inline_images(&self.assets_dir).await;
        let now = Utc::now();
        let recipients = distinct_recipients(&rows);

        for email in &recipients {
            let subset: Vec<&OverdueRow> = rows.iter().filter(|r| &r.email == email).collect();
            let to_name = subset.first().map(|r| r.full_name.clone()).unwrap_or_default();

            mailer
                .send(OutgoingMail {
                    to: email.clone(),
                    html: render_digest(&to_name, &subset, now),
                    to_name,
                    subject: SUBJECT.to_string(),
                    inline_images: images.clone(),
                })
                .await
                .inspect_err(|e| tracing::error!("Falha ao enviar resumo para {}: {}", email, e))?;

            tracing::info!("Resumo enviado para {} ({} processos)", email, subset.len());
        }

        let processes: HashSet<&str> = rows.iter().map(|r| r.record.as_str()).collect();
        Ok(DigestOutcome {
            sent: true,
            recipients: recipients.len(),
            processes: processes.len(),
        })
    }
}

/// E-mails distintos, na ordem em que aparecem.
pub fn distinct_recipients(rows: &[OverdueRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(r.email.as_str()))
        .map(|r| r.email.clone())
        .collect()
}

// Imagens ausentes só geram aviso: o e-mail sai sem elas.
async fn load_inline_images(dir: &Path) -> Vec<InlineImage> {
    let mut images = Vec::with_capacity(INLINE_IMAGES.len());
    for (content_id, file) in INLINE_IMAGES {
        let path = dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => images.push(InlineImage {
                content_id: content_id.to_string(),
                content_type: "image/png".to_string(),
                bytes,
            }),
            Err(e) => tracing::warn!("Imagem {} não carregada: {}", path.display(), e),
        }
    }
    images
}

pub fn render_digest(full_name: &str, rows: &[&OverdueRow], now: DateTime<Utc>) -> String {
    let mut lines = String::new();
    for row in rows {
        lines.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.record),
            escape_html(row.nickname.as_deref().unwrap_or("-")),
            escape_html(&row.flow_name),
            escape_html(&row.stage_name),
            row.entered_at.format("%d/%m/%Y"),
            row.days_late(now),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<body style="font-family: Arial, sans-serif; color: #333;">
<img src="cid:header" alt="" style="width: 100%;">
<img src="cid:logo" alt="" style="height: 64px;">
<p>Olá, {name}.</p>
<p>Os processos abaixo ultrapassaram o prazo da etapa em que se encontram:</p>
<table border="1" cellpadding="6" cellspacing="0" style="border-collapse: collapse;">
<thead><tr><th>Registro</th><th>Apelido</th><th>Fluxo</th><th>Etapa</th><th>Na etapa desde</th><th>Dias de atraso</th></tr></thead>
<tbody>{lines}</tbody>
</table>
<img src="cid:footer" alt="" style="width: 100%;">
</body>
</html>"#,
        name = escape_html(full_name),
        lines = lines,
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
