use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro único: tudo que sai de um handler passa por aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    // A mensagem já vem específica do campo (ex: "Este CPF já está cadastrado.")
    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("{0} não encontrado(a)")]
    ResourceNotFound(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário ainda não foi aceito")]
    UserNotAccepted,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro no envio de e-mail: {0}")]
    MailError(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::ResourceNotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::BAD_REQUEST,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserNotAccepted => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidInput(msg) => msg,
            AppError::UniqueConstraintViolation(msg) => msg,
            AppError::ResourceNotFound(what) => format!("{} não encontrado(a).", what),
            AppError::InvalidCredentials => "CPF/e-mail ou senha inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::UserNotAccepted => "Seu cadastro ainda não foi aceito por um administrador.".to_string(),

            // Todo o resto vira 500. O detalhe fica só no log, nunca na resposta.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// Converte violação de chave única em mensagem específica do campo.
// `fields` mapeia o nome da constraint do Postgres para a mensagem.
pub(crate) fn map_unique_violation(e: sqlx::Error, fields: &[(&str, &str)]) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = db_err
                .constraint()
                .and_then(|c| fields.iter().find(|(name, _)| *name == c))
                .map(|(_, msg)| msg.to_string())
                .unwrap_or_else(|| "Registro duplicado.".to_string());
            return AppError::UniqueConstraintViolation(message);
        }
    }
    e.into()
}
