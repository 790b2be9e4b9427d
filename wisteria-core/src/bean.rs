//! Bean 定义数据模型
//!
//! 描述"要构建什么"：目标类型、构造参数来源、属性赋值列表。
//! 定义在实例创建之前可以自由修改（后置处理器会这么做），创建之后不再回写。

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::bean_class::BeanClass;

/// 共享的 Bean 实例（类型擦除）
pub type BeanInstance = Arc<dyn Any + Send + Sync>;

/// 尚未放入单例缓存的 Bean 实例（独占所有权，类型擦除）
pub type BoxedBean = Box<dyn Any + Send + Sync>;

/// 对另一个 Bean 的命名引用
///
/// 只携带名称，不携带类型信息；在属性填充阶段通过递归 `get_bean` 解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanReference {
    bean_name: String,
}

impl BeanReference {
    pub fn new(bean_name: impl Into<String>) -> Self {
        Self {
            bean_name: bean_name.into(),
        }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }
}

/// 属性值：字面量或对其他 Bean 的引用
#[derive(Clone)]
pub enum BeanValue {
    /// 字面量，填充时原样传给 setter
    Literal(BeanInstance),
    /// 引用，填充时递归解析
    Reference(BeanReference),
}

impl BeanValue {
    /// 构造字面量属性值
    pub fn literal<T: Any + Send + Sync>(value: T) -> Self {
        BeanValue::Literal(Arc::new(value))
    }

    /// 构造引用属性值
    pub fn reference(bean_name: impl Into<String>) -> Self {
        BeanValue::Reference(BeanReference::new(bean_name))
    }
}

impl fmt::Debug for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanValue::Literal(_) => f.write_str("Literal(..)"),
            BeanValue::Reference(reference) => {
                f.debug_tuple("Reference").field(reference).finish()
            }
        }
    }
}

/// 一条属性赋值，创建后不可变
#[derive(Debug, Clone)]
pub struct PropertyValue {
    name: String,
    value: BeanValue,
}

impl PropertyValue {
    pub fn new(name: impl Into<String>, value: BeanValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &BeanValue {
        &self.value
    }
}

/// 有序的属性赋值集合
///
/// 追加同名属性时原位替换先前的条目，其余条目的插入顺序保持不变
#[derive(Debug, Clone, Default)]
pub struct MutablePropertyValues {
    values: Vec<PropertyValue>,
}

impl MutablePropertyValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条属性赋值，同名则替换
    pub fn add_property_value(&mut self, property_value: PropertyValue) {
        if let Some(existing) = self
            .values
            .iter_mut()
            .find(|existing| existing.name() == property_value.name())
        {
            *existing = property_value;
            return;
        }
        self.values.push(property_value);
    }

    /// `add_property_value` 的便捷形式
    pub fn add(&mut self, name: impl Into<String>, value: BeanValue) {
        self.add_property_value(PropertyValue::new(name, value));
    }

    pub fn get_property_value(&self, name: &str) -> Option<&PropertyValue> {
        self.values.iter().find(|pv| pv.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a MutablePropertyValues {
    type Item = &'a PropertyValue;
    type IntoIter = std::slice::Iter<'a, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Bean 定义：目标类型描述符 + 属性赋值列表
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    bean_class: Arc<BeanClass>,
    property_values: MutablePropertyValues,
}

impl BeanDefinition {
    pub fn new(bean_class: Arc<BeanClass>) -> Self {
        Self {
            bean_class,
            property_values: MutablePropertyValues::new(),
        }
    }

    /// 链式设置属性赋值列表
    pub fn with_property_values(mut self, property_values: MutablePropertyValues) -> Self {
        self.property_values = property_values;
        self
    }

    /// 链式追加一条属性赋值
    pub fn with_property(mut self, name: impl Into<String>, value: BeanValue) -> Self {
        self.property_values.add(name, value);
        self
    }

    pub fn bean_class(&self) -> &Arc<BeanClass> {
        &self.bean_class
    }

    pub fn property_values(&self) -> &MutablePropertyValues {
        &self.property_values
    }

    pub fn property_values_mut(&mut self) -> &mut MutablePropertyValues {
        &mut self.property_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_class::BeanClass;

    #[derive(Default)]
    struct Sample {
        value: i32,
    }

    fn sample_class() -> Arc<BeanClass> {
        BeanClass::builder::<Sample>("Sample")
            .default_constructor(Sample::default)
            .property("value", |bean: &mut Sample, value: i32| bean.value = value)
            .build()
    }

    #[test]
    fn test_add_property_value_keeps_insertion_order() {
        let mut pvs = MutablePropertyValues::new();
        pvs.add("id", BeanValue::literal(1i32));
        pvs.add("name", BeanValue::literal("a".to_string()));
        pvs.add("age", BeanValue::literal(20i32));

        let names: Vec<&str> = pvs.iter().map(|pv| pv.name()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
    }

    #[test]
    fn test_add_property_value_replaces_on_same_name() {
        let mut pvs = MutablePropertyValues::new();
        pvs.add("id", BeanValue::literal(1i32));
        pvs.add("name", BeanValue::literal("a".to_string()));
        pvs.add("id", BeanValue::literal(2i32));

        assert_eq!(pvs.len(), 2);
        let names: Vec<&str> = pvs.iter().map(|pv| pv.name()).collect();
        assert_eq!(names, vec!["id", "name"]);

        let replaced = pvs.get_property_value("id").unwrap();
        match replaced.value() {
            BeanValue::Literal(value) => {
                assert_eq!(*value.clone().downcast::<i32>().unwrap(), 2)
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_bean_definition_builder_style() {
        let definition = BeanDefinition::new(sample_class())
            .with_property("value", BeanValue::literal(42i32));

        assert_eq!(definition.property_values().len(), 1);
        assert!(definition.property_values().get_property_value("value").is_some());
        assert_eq!(definition.bean_class().name(), "Sample");
    }
}
