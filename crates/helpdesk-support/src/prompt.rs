//! Prompt and fallback texts for the Turkish support assistant.

use helpdesk_rs::agent::config::FallbackMessages;
use helpdesk_rs::agent::prompt::PromptTemplate;

use crate::tools::{FIND_NEAREST_STORE, SCHEDULE_APPOINTMENT};

/// The assistant's instruction preamble.
pub fn support_system_prompt() -> String {
    "\
Sen müşteri hizmetleri taleplerini karşılayan bir asistansın. Uygun aracı çağırarak kullanıcıya yardımcı ol.

Kurallar:
- Kullanıcıya her zaman Türkçe yanıt ver.
- Sipariş, e-posta, randevu ve mağaza soruları için ilgili aracı kullan; bilgi uydurma.
- Araç başarısız olursa nedenini kullanıcıya kısaca açıkla.
- Eksik bilgi varsa araç çağırmadan önce kullanıcıya sor."
        .to_string()
}

/// The date section. `{today}` and `{tomorrow}` are filled per utterance.
pub const DATE_HEADING: &str = "Tarih";
pub const DATE_NOTE: &str = "\
Bugünün tarihi {today}, yarının tarihi {tomorrow}. \"yarın\" gibi göreli \
tarihleri araç çağırmadan önce YYYY-AA-GG biçimine çevir.";

/// The prompt template used for every session.
pub fn support_prompt_template() -> PromptTemplate {
    PromptTemplate::new(support_system_prompt()).with_date_section(DATE_HEADING, DATE_NOTE)
}

/// Fallback replies and per-tool coaching, in Turkish.
pub fn support_messages() -> FallbackMessages {
    let generic = "Üzgünüm, isteğinizi işlerken bir sorun oluştu. \
                   Lütfen tekrar deneyin veya farklı bir şekilde sorun.";
    FallbackMessages {
        round_limit: generic.to_string(),
        adapter_exhausted: generic.to_string(),
        empty_answer: "Üzgünüm, bir yanıt oluşturamadım.".to_string(),
        cancelled: "(istek iptal edildi)".to_string(),
        clarification: "Önceki yanıtın işlenemedi. Mevcut araçlardan birini parametrelerine \
                        uygun argümanlarla çağır ya da düz metinle yanıt ver. Tarihler \
                        YYYY-AA-GG biçiminde olmalı; yarının tarihi {tomorrow}."
            .to_string(),
        coaching: Default::default(),
    }
    .with_coaching(
        SCHEDULE_APPOINTMENT,
        "Randevunuzu oluştururken bir sorun yaşadım. Lütfen tarihi YYYY-AA-GG \
         biçiminde (ör. 2024-05-02) ve saati SS:DD biçiminde (ör. 14:00) belirtir misiniz?",
    )
    .with_coaching(
        FIND_NEAREST_STORE,
        "Size en yakın mağazayı bulabilmem için lütfen bulunduğunuz şehri veya semti \
         yazın (ör. İstanbul, Ankara, İzmir, Bursa veya Antalya).",
    )
}
