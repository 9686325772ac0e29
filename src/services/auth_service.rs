// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult, ValidationError},
    models::user::{Role, SessionPrincipal, SignupForm},
    services::{notifier::Notifier, user_service},
};
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sqlx::SqlitePool;

/// Validade de um token de reset de senha.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const RESET_TOKEN_LEN: usize = 32;

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
// Custo mínimo nos testes (bcrypt é lento sem otimizações)
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt (com salt) para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, BCRYPT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Autentica email + senha para uma role específica.
/// Qualquer falha devolve o mesmo `InvalidCredentials`.
pub async fn authenticate(
    db_pool: &SqlitePool,
    email: &str,
    password: &str,
    required_role: Role,
) -> AppResult<SessionPrincipal> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = user_service::find_user_by_email_and_role(db_pool, email, required_role).await?
    else {
        tracing::warn!("Login falhou: sem conta '{}' com role '{}'", email, required_role);
        return Err(AppError::InvalidCredentials);
    };

    // Hash corrompido conta como credenciais inválidas, não como erro 500
    let password_ok = match verify_password(password, &user.password_hash).await {
        Ok(ok) => ok,
        Err(AppError::PasswordHashingError) => false,
        Err(e) => return Err(e),
    };
    if !password_ok {
        tracing::warn!("Senha incorreta para '{}'", email);
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("✅ Credenciais válidas para '{}' ({})", email, required_role);
    Ok(SessionPrincipal {
        user_id: user.id,
        role: required_role,
        display_name: user.full_name,
    })
}

/// Resultado da verificação de acesso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed(SessionPrincipal),
    Denied,
}

/// Nega sem sessão ou quando a role da sessão difere da exigida.
pub fn authorize(principal: Option<SessionPrincipal>, required_role: Role) -> Authorization {
    match principal {
        Some(p) if p.role == required_role => Authorization::Allowed(p),
        _ => Authorization::Denied,
    }
}

/// Regista uma conta nova. Não inicia sessão.
pub async fn signup(
    db_pool: &SqlitePool,
    form: &SignupForm,
    admin_signup_key: &str,
    now: DateTime<Utc>,
) -> AppResult<String> {
    let full_name = form.full_name.trim();
    let email = form.email.trim();
    let mobile = form.mobile.trim();

    if full_name.is_empty()
        || email.is_empty()
        || mobile.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
        || form.role.trim().is_empty()
    {
        return Err(ValidationError::MissingFields.into());
    }

    let role: Role = form.role.parse().map_err(|_| ValidationError::InvalidRole)?;
    if role == Role::Admin {
        if form.admin_key.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }
        if admin_signup_key.is_empty() || form.admin_key != admin_signup_key {
            tracing::warn!("Registo admin recusado para '{}': chave inválida", email);
            return Err(ValidationError::InvalidAdminKey.into());
        }
    }

    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }

    if user_service::email_or_mobile_taken(db_pool, email, mobile).await? {
        tracing::warn!("Registo recusado: email '{}' ou telemóvel já existe", email);
        return Err(ValidationError::Duplicate.into());
    }

    let password_hash = hash_password(&form.password).await?;
    user_service::insert_user(db_pool, full_name, email, mobile, &password_hash, role, now).await
}

fn generate_reset_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Pede um reset de senha. Nunca revela se o email existe.
pub async fn issue_reset_token(
    db_pool: &SqlitePool,
    notifier: &dyn Notifier,
    base_url: &str,
    email: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(());
    }

    let Some(user) = user_service::find_user_by_email(db_pool, email).await? else {
        tracing::info!("Reset pedido para email desconhecido; nada a enviar.");
        return Ok(());
    };

    let token = generate_reset_token();
    let expires_at = now + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    sqlx::query("INSERT INTO password_resets (token, email, expires_at) VALUES (?1, ?2, ?3)")
        .bind(&token)
        .bind(&user.email)
        .bind(expires_at.timestamp())
        .execute(db_pool)
        .await?;

    let link = format!("{}/reset-password/{}", base_url, token);
    notifier.deliver(
        &user.email,
        &format!("Use this link to reset your password (valid for 1 hour): {}", link),
    );
    tracing::info!("🔑 Token de reset emitido para '{}'", user.email);
    Ok(())
}

/// Confirma que o token existe e ainda não expirou. Devolve o email associado.
pub async fn find_valid_reset_token(
    db_pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> AppResult<Option<String>> {
    let email: Option<String> = sqlx::query_scalar(
        "SELECT email FROM password_resets WHERE token = ?1 AND expires_at > ?2",
    )
    .bind(token)
    .bind(now.timestamp())
    .fetch_optional(db_pool)
    .await?;
    Ok(email)
}

/// Troca a senha com um token. No sucesso apaga todos os tokens desse email
/// e os tokens já expirados.
pub async fn consume_reset_token(
    db_pool: &SqlitePool,
    token: &str,
    new_password: &str,
    confirm_password: &str,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let Some(email) = find_valid_reset_token(db_pool, token, now).await? else {
        tracing::warn!("Token de reset inexistente ou expirado");
        return Err(ValidationError::NotFoundOrExpired.into());
    };

    if new_password.is_empty() || confirm_password.is_empty() {
        return Err(ValidationError::MissingFields.into());
    }
    if new_password != confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }

    let new_hash = hash_password(new_password).await?;
    user_service::update_password_hash_by_email(db_pool, &email, &new_hash).await?;

    let purged = sqlx::query("DELETE FROM password_resets WHERE email = ?1 OR expires_at <= ?2")
        .bind(&email)
        .bind(now.timestamp())
        .execute(db_pool)
        .await?
        .rows_affected();
    tracing::debug!("{} token(s) de reset removidos.", purged);

    tracing::info!("✅ Senha redefinida via token para '{}'", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use crate::services::notifier::MemoryNotifier;

    const ADMIN_KEY: &str = "letmein";

    fn signup_form(email: &str, mobile: &str, role: &str) -> SignupForm {
        SignupForm {
            full_name: "Ada Lovelace".into(),
            email: email.into(),
            mobile: mobile.into(),
            password: "s3cret-pass".into(),
            confirm_password: "s3cret-pass".into(),
            role: role.into(),
            admin_key: if role == "admin" { ADMIN_KEY.into() } else { String::new() },
        }
    }

    fn validation_code(err: AppError) -> &'static str {
        match err {
            AppError::Validation(v) => v.code(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn token_from(notifier: &MemoryNotifier) -> String {
        let (_, message) = notifier.sent().pop().expect("a reset message");
        message
            .rsplit('/')
            .next()
            .expect("token at end of link")
            .to_string()
    }

    #[tokio::test]
    async fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct-horse").await.unwrap();
        assert_ne!(hash, "correct-horse");
        assert!(verify_password("correct-horse", &hash).await.unwrap());
        assert!(!verify_password("battery-staple", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn signup_then_authenticate_returns_matching_principal() {
        let pool = memory_pool().await;
        let id = signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let principal = authenticate(&pool, "ada@example.com", "s3cret-pass", Role::User)
            .await
            .unwrap();
        assert_eq!(principal.user_id, id);
        assert_eq!(principal.role, Role::User);
        assert_eq!(principal.display_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn admin_signup_authenticates_as_admin() {
        let pool = memory_pool().await;
        signup(&pool, &signup_form("root@example.com", "555-0199", "admin"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();
        let principal = authenticate(&pool, "root@example.com", "s3cret-pass", Role::Admin)
            .await
            .unwrap();
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn authenticate_treats_other_role_as_missing_account() {
        let pool = memory_pool().await;
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let err = authenticate(&pool, "ada@example.com", "s3cret-pass", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password_and_unknown_email_alike() {
        let pool = memory_pool().await;
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let wrong_password = authenticate(&pool, "ada@example.com", "nope", Role::User).await.unwrap_err();
        let unknown = authenticate(&pool, "bob@example.com", "s3cret-pass", Role::User).await.unwrap_err();
        let empty = authenticate(&pool, "", "", Role::User).await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown.to_string());
        assert_eq!(unknown.to_string(), "Invalid email or password");
        assert!(matches!(empty, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email_or_mobile() {
        let pool = memory_pool().await;
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let same_email = signup(&pool, &signup_form("ada@example.com", "555-0101", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(same_email), "duplicate");

        // Telemóvel repetido, mesmo com role diferente
        let same_mobile = signup(&pool, &signup_form("other@example.com", "555-0100", "admin"), ADMIN_KEY, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(same_mobile), "duplicate");
    }

    #[tokio::test]
    async fn signup_validates_fields_before_touching_the_store() {
        let pool = memory_pool().await;

        let mut missing = signup_form("ada@example.com", "555-0100", "user");
        missing.full_name = "   ".into();
        let err = signup(&pool, &missing, ADMIN_KEY, Utc::now()).await.unwrap_err();
        assert_eq!(validation_code(err), "missing_fields");

        let mut mismatch = signup_form("ada@example.com", "555-0100", "user");
        mismatch.confirm_password = "different".into();
        let err = signup(&pool, &mismatch, ADMIN_KEY, Utc::now()).await.unwrap_err();
        assert_eq!(validation_code(err), "password_mismatch");

        let mut bad_key = signup_form("root@example.com", "555-0199", "admin");
        bad_key.admin_key = "guess".into();
        let err = signup(&pool, &bad_key, ADMIN_KEY, Utc::now()).await.unwrap_err();
        assert_eq!(validation_code(err), "invalid_admin_key");

        let err = signup(&pool, &signup_form("x@example.com", "1", "librarian"), ADMIN_KEY, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(err), "invalid_role");

        // Nada foi gravado
        assert!(!user_service::email_or_mobile_taken(&pool, "ada@example.com", "555-0100").await.unwrap());
    }

    #[test]
    fn authorize_requires_matching_role() {
        let admin = SessionPrincipal {
            user_id: "1".into(),
            role: Role::Admin,
            display_name: "Root".into(),
        };
        assert_eq!(authorize(None, Role::User), Authorization::Denied);
        assert_eq!(authorize(Some(admin.clone()), Role::User), Authorization::Denied);
        assert_eq!(
            authorize(Some(admin.clone()), Role::Admin),
            Authorization::Allowed(admin)
        );
    }

    #[tokio::test]
    async fn reset_token_is_single_use() {
        let pool = memory_pool().await;
        let notifier = MemoryNotifier::default();
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        issue_reset_token(&pool, &notifier, "http://library.test", "ada@example.com", Utc::now())
            .await
            .unwrap();
        let token = token_from(&notifier);
        assert_eq!(token.len(), RESET_TOKEN_LEN);

        consume_reset_token(&pool, &token, "new-pass", "new-pass", Utc::now())
            .await
            .unwrap();
        assert!(authenticate(&pool, "ada@example.com", "new-pass", Role::User).await.is_ok());
        assert!(authenticate(&pool, "ada@example.com", "s3cret-pass", Role::User).await.is_err());

        let second = consume_reset_token(&pool, &token, "other-pass", "other-pass", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(second), "not_found_or_expired");
    }

    #[tokio::test]
    async fn reset_revokes_other_tokens_and_purges_expired_ones() {
        let pool = memory_pool().await;
        let notifier = MemoryNotifier::default();
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();
        signup(&pool, &signup_form("bob@example.com", "555-0101", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let stale_at = Utc::now() - Duration::minutes(RESET_TOKEN_TTL_MINUTES + 5);
        issue_reset_token(&pool, &notifier, "http://library.test", "bob@example.com", stale_at)
            .await
            .unwrap();
        issue_reset_token(&pool, &notifier, "http://library.test", "ada@example.com", Utc::now())
            .await
            .unwrap();
        let older = token_from(&notifier);
        issue_reset_token(&pool, &notifier, "http://library.test", "ada@example.com", Utc::now())
            .await
            .unwrap();
        let newer = token_from(&notifier);
        assert_ne!(older, newer);

        consume_reset_token(&pool, &newer, "new-pass", "new-pass", Utc::now())
            .await
            .unwrap();

        let err = consume_reset_token(&pool, &older, "other-pass", "other-pass", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(err), "not_found_or_expired");
        assert!(authenticate(&pool, "ada@example.com", "new-pass", Role::User).await.is_ok());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_resets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn reset_token_expires_after_one_hour() {
        let pool = memory_pool().await;
        let notifier = MemoryNotifier::default();
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();

        let issued_at = Utc::now() - Duration::minutes(RESET_TOKEN_TTL_MINUTES + 1);
        issue_reset_token(&pool, &notifier, "http://library.test", "ada@example.com", issued_at)
            .await
            .unwrap();
        let token = token_from(&notifier);

        let err = consume_reset_token(&pool, &token, "new-pass", "new-pass", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(validation_code(err), "not_found_or_expired");
    }

    #[tokio::test]
    async fn reset_mismatch_keeps_token_usable() {
        let pool = memory_pool().await;
        let notifier = MemoryNotifier::default();
        signup(&pool, &signup_form("ada@example.com", "555-0100", "user"), ADMIN_KEY, Utc::now())
            .await
            .unwrap();
        issue_reset_token(&pool, &notifier, "http://library.test", "ada@example.com", Utc::now())
            .await
            .unwrap();
        let token = token_from(&notifier);

        let err = consume_reset_token(&pool, &token, "a", "b", Utc::now()).await.unwrap_err();
        assert_eq!(validation_code(err), "password_mismatch");
        assert!(consume_reset_token(&pool, &token, "abc", "abc", Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_sends_nothing() {
        let pool = memory_pool().await;
        let notifier = MemoryNotifier::default();
        issue_reset_token(&pool, &notifier, "http://library.test", "ghost@example.com", Utc::now())
            .await
            .unwrap();
        assert!(notifier.sent().is_empty());
    }
}
