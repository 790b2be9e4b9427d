//! Bean 定义加载边界
//!
//! 注册表本身允许同名覆盖；“重名即错误”是加载层的策略，收敛在这里。

use crate::bean::BeanDefinition;
use crate::bean_factory::BeanDefinitionRegistry;
use crate::error::{ContainerError, ContainerResult};

/// 面向注册表的定义加载器
pub struct BeanDefinitionReader<'r> {
    registry: &'r dyn BeanDefinitionRegistry,
}

impl<'r> BeanDefinitionReader<'r> {
    pub fn new(registry: &'r dyn BeanDefinitionRegistry) -> Self {
        Self { registry }
    }

    /// 注册一条定义，重名拒绝
    pub fn register(&self, bean_name: &str, definition: BeanDefinition) -> ContainerResult<()> {
        if self.registry.contains_bean_definition(bean_name) {
            return Err(ContainerError::DuplicateBeanDefinition(
                bean_name.to_string(),
            ));
        }
        self.registry.register_bean_definition(bean_name, definition);
        Ok(())
    }

    /// 注册一条定义，名称取简单类型名首字母小写
    pub fn register_auto_named(&self, definition: BeanDefinition) -> ContainerResult<String> {
        let bean_name = definition.bean_class().default_bean_name();
        self.register(&bean_name, definition)?;
        Ok(bean_name)
    }

    /// 按来源顺序批量注册，遇到首个重名即中止
    ///
    /// 返回成功注册的条数
    pub fn load<I>(&self, entries: I) -> ContainerResult<usize>
    where
        I: IntoIterator<Item = (String, BeanDefinition)>,
    {
        let mut count = 0;
        for (bean_name, definition) in entries {
            self.register(&bean_name, definition)?;
            count += 1;
        }
        tracing::debug!("Loaded {} bean definition(s)", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean_class::BeanClass;
    use crate::bean_factory::{BeanFactory, DefaultListableBeanFactory};
    use std::sync::Arc;

    #[derive(Default)]
    struct OrderService;

    fn order_service_class() -> Arc<BeanClass> {
        BeanClass::builder::<OrderService>("OrderService")
            .default_constructor(OrderService::default)
            .build()
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let factory = DefaultListableBeanFactory::new();
        let reader = BeanDefinitionReader::new(&factory);

        reader
            .register("orderService", BeanDefinition::new(order_service_class()))
            .unwrap();
        let err = reader
            .register("orderService", BeanDefinition::new(order_service_class()))
            .unwrap_err();
        assert!(
            matches!(err, ContainerError::DuplicateBeanDefinition(name) if name == "orderService")
        );
    }

    #[test]
    fn test_duplicate_does_not_disturb_existing_instance() {
        let factory = DefaultListableBeanFactory::new();
        let reader = BeanDefinitionReader::new(&factory);
        reader
            .register("orderService", BeanDefinition::new(order_service_class()))
            .unwrap();

        let before = factory.get_bean("orderService").unwrap();
        let _ = reader
            .register("orderService", BeanDefinition::new(order_service_class()))
            .unwrap_err();
        let after = factory.get_bean("orderService").unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_register_auto_named() {
        let factory = DefaultListableBeanFactory::new();
        let reader = BeanDefinitionReader::new(&factory);

        let name = reader
            .register_auto_named(BeanDefinition::new(order_service_class()))
            .unwrap();
        assert_eq!(name, "orderService");
        assert!(factory.contains_bean("orderService"));
    }

    #[test]
    fn test_load_aborts_on_first_duplicate() {
        let factory = DefaultListableBeanFactory::new();
        let reader = BeanDefinitionReader::new(&factory);

        let entries = vec![
            ("a".to_string(), BeanDefinition::new(order_service_class())),
            ("b".to_string(), BeanDefinition::new(order_service_class())),
            ("a".to_string(), BeanDefinition::new(order_service_class())),
            ("c".to_string(), BeanDefinition::new(order_service_class())),
        ];
        let err = reader.load(entries).unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateBeanDefinition(_)));

        assert!(factory.contains_bean("a"));
        assert!(factory.contains_bean("b"));
        assert!(!factory.contains_bean("c"));
    }
}
