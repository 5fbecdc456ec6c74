// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub cpf: String,
    pub full_name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password: String,

    pub accepted: bool,
    pub unit_id: i32,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados já prontos para gravar (senha já em hash)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub cpf: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub unit_id: i32,
    pub role_id: i32,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(equal = 11, message = "O CPF deve ter 11 dígitos."))]
    pub cpf: String,
    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub unit_id: i32,
    pub role_id: i32,
}

// Dados para login: aceita CPF ou e-mail no mesmo campo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "Informe o CPF ou e-mail."))]
    pub login: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Alterações administrativas (cargo, unidade, nome, e-mail)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "O nome completo é obrigatório."))]
    pub full_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub unit_id: i32,
    pub role_id: i32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub unit_id: Option<i32>,
    pub accepted: Option<bool>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (CPF do usuário)
    pub exp: usize,  // Expiration time (quando o token expira)
    pub iat: usize,  // Issued At (quando o token foi criado)
}
