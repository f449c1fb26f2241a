//! UseCase: 接続の受け入れ（認証とチームスコープの解決）
//!
//! ソケットのアップグレード前に実行され、失敗してもレジストリには一切触れません。

use std::sync::Arc;

use crate::domain::{ConnectionIdentity, IdentityVerifier, TeamId, ValueObjectError};

use super::error::AdmissionError;

/// 接続受け入れのユースケース
pub struct AdmitConnectionUseCase {
    verifier: Arc<dyn IdentityVerifier>,
}

impl AdmitConnectionUseCase {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// 接続を受け入れるかどうかを判定する
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer トークン（ヘッダーまたはクエリ）
    /// * `team_id` - `team_id` クエリパラメータ
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionIdentity)` - 接続に束縛する (user, team)
    /// * `Err(AdmissionError)` - 受け入れ拒否
    pub fn execute(
        &self,
        token: Option<&str>,
        team_id: Option<&str>,
    ) -> Result<ConnectionIdentity, AdmissionError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AdmissionError::MissingToken)?;
        let user_id = self.verifier.verify(token)?;

        let raw_team = team_id
            .filter(|t| !t.trim().is_empty())
            .ok_or(AdmissionError::MissingTeam)?;
        let team_id = TeamId::new(raw_team.to_string()).map_err(|e| match e {
            ValueObjectError::TeamIdEmpty => AdmissionError::MissingTeam,
            _ => AdmissionError::InvalidTeam(raw_team.to_string()),
        })?;

        Ok(ConnectionIdentity::new(user_id, team_id))
    }
}
