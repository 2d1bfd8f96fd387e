// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 登录身份
///
/// 虚拟用户连接应用服务器时使用的身份，可以是用户名/密码凭据，
/// 也可以是当前操作系统用户（平台身份）。
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// 用户名/密码凭据
    Credentials { username: String, password: String },
    /// 当前平台用户
    Platform,
}

impl Identity {
    /// 创建凭据身份
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Identity::Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 会话缓存键
    ///
    /// 同一个键只会对应一个已缓存的会话。密码不参与键的计算。
    pub fn key(&self) -> String {
        match self {
            Identity::Credentials { username, .. } => format!("user:{}", username),
            Identity::Platform => "platform".to_string(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Identity::Platform => write!(f, "Platform"),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Credentials { username, .. } => write!(f, "{}", username),
            Identity::Platform => write!(f, "<platform user>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_password() {
        let a = Identity::credentials("ORDERPROC", "secret-1");
        let b = Identity::credentials("ORDERPROC", "secret-2");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Identity::Platform.key());
    }

    #[test]
    fn test_debug_redacts_password() {
        let identity = Identity::credentials("ORDERPROC", "hunter2");
        let rendered = format!("{:?}", identity);
        assert!(rendered.contains("ORDERPROC"));
        assert!(!rendered.contains("hunter2"));
    }
}
