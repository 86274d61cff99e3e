/// Erros de parsing do protocolo RESP.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
}

/// Erros do engine de armazenamento.
///
/// Todos são determinísticos: o mesmo estado e a mesma entrada produzem
/// sempre o mesmo erro, e nenhuma mutação da chamada fica visível.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("chave não encontrada")]
    NotFound,
    #[error("operação contra chave com tipo errado")]
    WrongType,
    #[error("valor não é um inteiro válido ou está fora do intervalo")]
    NotAnInteger,
    #[error("valor não é um float válido")]
    NotAFloat,
    #[error("limite de intervalo inválido: {0}")]
    InvalidBound(String),
    #[error("padrão glob inválido: {0}")]
    InvalidPattern(String),
    #[error("tempo de expiração inválido: {0}")]
    InvalidExpire(i64),
}

impl StorageError {
    /// Falhas de coerção numérica (valor armazenado ou argumento).
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            StorageError::NotAnInteger | StorageError::NotAFloat | StorageError::InvalidBound(_)
        )
    }
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocolo: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("servidor em shutdown")]
    Shutdown,
    #[error("timeout ao conectar em {0}")]
    Timeout(String),
}

/// Erros de parsing/validação de comandos.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("comando desconhecido: {0}")]
    Unknown(String),
    #[error("número errado de argumentos para '{0}'")]
    WrongArity(String),
    #[error("opção inválida para SET: {0}")]
    InvalidSetOption(String),
    #[error("argumento inválido: {0}")]
    InvalidArgument(String),
}

/// Erro top-level dos clientes twinkv.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("erro do servidor: {0}")]
    Server(String),
    #[error("resposta inesperada para {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },
    #[error("operação não suportada: {0}")]
    Unsupported(&'static str),
    #[error("cliente fechado")]
    Closed,
}

impl ClientError {
    /// Retorna o erro de storage subjacente, se houver.
    pub fn storage(&self) -> Option<&StorageError> {
        match self {
            ClientError::Storage(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Storage(StorageError::NotFound))
    }

    pub fn is_wrong_type(&self) -> bool {
        matches!(self, ClientError::Storage(StorageError::WrongType))
    }

    pub fn is_conversion(&self) -> bool {
        self.storage().is_some_and(StorageError::is_conversion)
    }
}

/// Result type alias.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias.
pub type ClientResult<T> = Result<T, ClientError>;

// Conversão implícita de io::Error → ClientError (via ConnectionError)
impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Connection(ConnectionError::Io(e))
    }
}
