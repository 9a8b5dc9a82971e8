//! Value Object 定義
//!
//! 参加者 ID とルーム ID。どちらも空でない 128 バイト以下の文字列で、
//! 生成後は不変です。

use std::fmt;

use super::error::ValueObjectError;

/// ID に許される最大長（バイト）
pub const MAX_ID_LEN: usize = 128;

fn validate_id(value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(ValueObjectError::Empty);
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValueObjectError::TooLong {
            max: MAX_ID_LEN,
            actual: value.len(),
        });
    }
    Ok(())
}

/// 参加者の識別子
///
/// 接続が生きている間は変わらない。ルーム内のメンバーシップのキーになる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// 新しい ParticipantId を作成
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    /// UUID v4 から ParticipantId を生成
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ルームの識別子（Registry 内で一意）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// 新しい RoomId を作成
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_accepts_valid_value() {
        // テスト項目: 空でない ID から ParticipantId を作成できる
        // given (前提条件):
        let value = "alice".to_string();

        // when (操作):
        let result = ParticipantId::new(value);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_participant_id_rejects_empty_value() {
        // テスト項目: 空文字列はエラーになる
        // given (前提条件):
        let value = String::new();

        // when (操作):
        let result = ParticipantId::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty));
    }

    #[test]
    fn test_room_id_rejects_too_long_value() {
        // テスト項目: 最大長を超える ID はエラーになる
        // given (前提条件):
        let value = "r".repeat(MAX_ID_LEN + 1);

        // when (操作):
        let result = RoomId::new(value);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::TooLong {
                max: MAX_ID_LEN,
                actual: MAX_ID_LEN + 1,
            })
        );
    }

    #[test]
    fn test_room_id_accepts_max_length_value() {
        // テスト項目: ちょうど最大長の ID は受け付けられる
        // given (前提条件):
        let value = "r".repeat(MAX_ID_LEN);

        // when (操作):
        let result = RoomId::try_from(value.clone());

        // then (期待する結果):
        assert_eq!(result.unwrap().into_string(), value);
    }

    #[test]
    fn test_generated_participant_ids_are_unique() {
        // テスト項目: 生成された ID は毎回異なる
        // when (操作):
        let id1 = ParticipantId::generate();
        let id2 = ParticipantId::generate();

        // then (期待する結果):
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }
}
