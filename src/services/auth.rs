// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{RoleRepository, UnitRepository, UserRepository},
    models::auth::{Claims, NewUser, RegisterUserPayload, User},
};

// Validade do token emitido no login
const TOKEN_TTL_DAYS: i64 = 3;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    units: Arc<dyn UnitRepository>,
    roles: Arc<dyn RoleRepository>,
    jwt_secret: String,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        units: Arc<dyn UnitRepository>,
        roles: Arc<dyn RoleRepository>,
        jwt_secret: String,
    ) -> Self {
        Self { users, units, roles, jwt_secret, bcrypt_cost: bcrypt::DEFAULT_COST }
    }

    /// Custo menor deixa os testes rápidos; em produção fica o DEFAULT_COST.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Cadastra um usuário ainda não aceito. Quem aceita é um administrador.
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<User, AppError> {
        if self.units.find_by_id(payload.unit_id).await?.is_none() {
            return Err(AppError::not_found(format!("Unidade {}", payload.unit_id)));
        }
        if self.roles.find_by_id(payload.role_id).await?.is_none() {
            return Err(AppError::not_found(format!("Cargo {}", payload.role_id)));
        }

        // Hashing fora do runtime assíncrono (bcrypt é CPU-bound)
        let password_clone = payload.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .users
            .create(&NewUser {
                cpf: payload.cpf.clone(),
                full_name: payload.full_name.clone(),
                email: payload.email.clone(),
                password_hash,
                unit_id: payload.unit_id,
                role_id: payload.role_id,
            })
            .await?;

        tracing::info!("Novo usuário cadastrado (aguardando aceite): {}", user.cpf);
        Ok(user)
    }

    /// `login` pode ser o CPF ou o e-mail.
    pub async fn login_user(&self, login: &str, password: &str) -> Result<String, AppError> {
        let maybe_user = if login.contains('@') {
            self.users.find_by_email(login).await?
        } else {
            self.users.find_by_id(login).await?
        };
        let user = maybe_user.ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.accepted {
            return Err(AppError::UserNotAccepted);
        }

        self.create_token(&user.cpf)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        // Usuário apagado depois do login: o token deixa de valer
        self.users
            .find_by_id(&token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn create_token(&self, cpf: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: cpf.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
