use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewImage {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub user_id: Uuid,
}
